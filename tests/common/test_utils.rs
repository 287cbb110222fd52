use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use anyhow::bail;
use cgmath::{Point3, Vector3};
use flow_scene::{
    DrawableSurface, Host, RenderBackend, SurfaceSize, render::Frame,
};

/// Element ids and canvas sizes of a fake document, shareable between hosts.
#[derive(Debug, Default)]
pub struct Document {
    pub element_ids: Vec<String>,
    pub applied_sizes: Vec<SurfaceSize>,
}

/// A host whose viewport size is set by the test.
#[derive(Clone, Debug)]
pub struct FakeHost {
    pub document: Rc<RefCell<Document>>,
    viewport: Rc<Cell<SurfaceSize>>,
}

impl FakeHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            document: Rc::new(RefCell::new(Document::default())),
            viewport: Rc::new(Cell::new(SurfaceSize::new(width, height))),
        }
    }

    /// Another host on the same document, like a second script on one page.
    pub fn sharing_document(&self) -> Self {
        Self {
            document: self.document.clone(),
            viewport: Rc::new(Cell::new(self.viewport.get())),
        }
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.viewport.set(SurfaceSize::new(width, height));
    }

    pub fn elements_with_id(&self, id: &str) -> usize {
        self.document
            .borrow()
            .element_ids
            .iter()
            .filter(|e| *e == id)
            .count()
    }

    pub fn applied_sizes(&self) -> Vec<SurfaceSize> {
        self.document.borrow().applied_sizes.clone()
    }
}

impl Host for FakeHost {
    type Target = ();

    fn create_surface(&mut self, id: &str) -> anyhow::Result<(DrawableSurface, ())> {
        let mut document = self.document.borrow_mut();
        if document.element_ids.iter().any(|e| e == id) {
            bail!("an element with id `{}` is already attached to the document", id);
        }
        document.element_ids.push(id.to_string());
        Ok((DrawableSurface::new(id, SurfaceSize::default()), ()))
    }

    fn inner_size(&self) -> SurfaceSize {
        self.viewport.get()
    }

    fn apply_surface_size(&mut self, surface: &DrawableSurface) {
        self.document.borrow_mut().applied_sizes.push(surface.size());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub camera_position: Point3<f32>,
    pub camera_target: Point3<f32>,
    pub light_direction: Vector3<f32>,
    pub meshes: Vec<String>,
}

/// Records what the engine asks of it instead of touching a GPU.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub resizes: Vec<SurfaceSize>,
    pub draws: Vec<DrawRecord>,
    pub fail_draws: bool,
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, size: SurfaceSize) {
        self.resizes.push(size);
    }

    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
        self.draws.push(DrawRecord {
            camera_position: frame.camera.position(),
            camera_target: frame.camera.target(),
            light_direction: frame.light.direction,
            meshes: frame.drawable_meshes().map(|m| m.name.clone()).collect(),
        });
        if self.fail_draws {
            bail!("device lost");
        }
        Ok(())
    }
}
