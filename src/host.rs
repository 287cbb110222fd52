//! The host environment the application is embedded in.
//!
//! The bootstrapper never reaches for a global window or document. Everything it
//! needs from its surroundings goes through the [`Host`] capability: creating
//! and attaching the drawable surface, reading the current viewport size and
//! pushing a new pixel size back onto the surface. Lifecycle signals arrive as
//! [`HostEvent`]s, so tests can substitute a host that synthesises them.
//!
//! [`WinitHost`] is the production host. Natively the surface is the window's
//! client area; on wasm32 it is a `<canvas>` created and appended to
//! `document.body`.

use std::sync::Arc;

use anyhow::bail;
#[cfg(target_arch = "wasm32")]
use anyhow::{Context as _, anyhow};
use winit::window::{Window, WindowAttributes};

use crate::{
    camera::ControlInput,
    surface::{DrawableSurface, SurfaceSize},
};

/// Lifecycle and input signals delivered by the host, in host-determined order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    /// The host finished loading; fires once.
    Load,
    /// The host viewport changed size; may fire any number of times.
    Resize,
    /// A display refresh is due.
    Frame,
    /// User input aimed at the drawable surface.
    Input(ControlInput),
}

/// Capability interface onto the host document and window.
pub trait Host {
    /// Whatever the render backend needs to bind itself to the created surface.
    type Target;

    /// Create the drawable surface with the given id and attach it to the document.
    ///
    /// Fails when the host cannot provide a document or when a surface with the
    /// same id is already attached.
    fn create_surface(&mut self, id: &str) -> anyhow::Result<(DrawableSurface, Self::Target)>;

    /// Current inner size of the host viewport in pixels.
    fn inner_size(&self) -> SurfaceSize;

    /// Write the surface's pixel size back to the host element.
    fn apply_surface_size(&mut self, surface: &DrawableSurface);
}

/// Host backed by a winit window (and a DOM canvas on the web).
#[derive(Debug, Default)]
pub struct WinitHost {
    surface_id: Option<String>,
    window: Option<Arc<Window>>,
    #[cfg(target_arch = "wasm32")]
    canvas: Option<web_sys::HtmlCanvasElement>,
}

impl WinitHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the window created from the attributes returned by [`Host::create_surface`].
    pub fn bind_window(&mut self, window: Arc<Window>) {
        self.window = Some(window);
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    #[cfg(target_arch = "wasm32")]
    fn attach_canvas(&mut self, id: &str) -> anyhow::Result<web_sys::HtmlCanvasElement> {
        use wasm_bindgen::JsCast;

        let window = web_sys::window().context("no global `window` exists")?;
        let document = window.document().context("window has no document")?;
        if document.get_element_by_id(id).is_some() {
            bail!("an element with id `{}` is already attached to the document", id);
        }
        let body = document.body().context("document has no body")?;
        let canvas = document
            .create_element("canvas")
            .map_err(|e| anyhow!("could not create canvas: {:?}", e))?
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .map_err(|_| anyhow!("created element is not a canvas"))?;
        canvas.set_id(id);
        body.append_child(&canvas)
            .map_err(|e| anyhow!("could not append canvas to body: {:?}", e))?;
        Ok(canvas)
    }
}

impl Host for WinitHost {
    type Target = WindowAttributes;

    fn create_surface(&mut self, id: &str) -> anyhow::Result<(DrawableSurface, WindowAttributes)> {
        if let Some(existing) = &self.surface_id {
            bail!("surface `{}` is already attached to this host", existing);
        }

        #[allow(unused_mut)]
        let mut attributes = Window::default_attributes().with_title(id);
        #[allow(unused_mut)]
        let mut size = SurfaceSize::default();

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = self.attach_canvas(id)?;
            size = SurfaceSize::new(canvas.width(), canvas.height());
            attributes = attributes.with_canvas(Some(canvas.clone()));
            self.canvas = Some(canvas);
        }

        log::info!("attached drawable surface `{}`", id);
        self.surface_id = Some(id.to_string());
        Ok((DrawableSurface::new(id, size), attributes))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn inner_size(&self) -> SurfaceSize {
        self.window
            .as_ref()
            .map(|window| window.inner_size().into())
            .unwrap_or_default()
    }

    #[cfg(target_arch = "wasm32")]
    fn inner_size(&self) -> SurfaceSize {
        let size = web_sys::window().and_then(|window| {
            let width = window.inner_width().ok()?.as_f64()?;
            let height = window.inner_height().ok()?.as_f64()?;
            Some(SurfaceSize::new(width as u32, height as u32))
        });
        size.unwrap_or_default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn apply_surface_size(&mut self, surface: &DrawableSurface) {
        // The window's client area already is the surface.
        log::trace!("surface `{}` is now {}", surface.id(), surface.size());
    }

    #[cfg(target_arch = "wasm32")]
    fn apply_surface_size(&mut self, surface: &DrawableSurface) {
        if let Some(canvas) = &self.canvas {
            canvas.set_width(surface.width());
            canvas.set_height(surface.height());
        }
    }
}
