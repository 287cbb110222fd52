//! The drawable surface: the pixel buffer the engine renders into.
//!
//! On the web this is the `<canvas>` element appended to the document, natively
//! it is the window's client area. The engine only ever reads the pixel size
//! recorded here; the host decides what the size is.

use std::fmt::Display;

/// Pixel dimensions of a drawable surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-sized surface cannot back a swapchain (minimised window, hidden canvas).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

impl Display for SurfaceSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The one surface a bootstrapped application draws to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawableSurface {
    id: String,
    size: SurfaceSize,
}

impl DrawableSurface {
    pub fn new(id: impl Into<String>, size: SurfaceSize) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sizes_are_detected() {
        assert!(SurfaceSize::new(0, 10).is_empty());
        assert!(SurfaceSize::new(10, 0).is_empty());
        assert!(!SurfaceSize::new(1, 1).is_empty());
    }

    #[test]
    fn aspect_of_zero_height_falls_back_to_square() {
        assert_eq!(SurfaceSize::new(800, 0).aspect(), 1.0);
        assert_eq!(SurfaceSize::new(800, 400).aspect(), 2.0);
    }
}
