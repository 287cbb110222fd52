//! The render engine: owns the drawable surface and the backend bound to it,
//! and drives the registered render loops once per host frame.

use std::{cell::Cell, rc::Rc};

use crate::{
    render::Frame,
    resources::loader::SceneLoader,
    surface::{DrawableSurface, SurfaceSize},
};

/// Id of the canvas element the engine draws into.
pub const DEFAULT_CANVAS_ID: &str = "gameCanvas";

/// Construction-time engine settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    pub canvas_id: String,
    /// Multisample the back buffer (4x).
    pub antialias: bool,
}

impl EngineOptions {
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            canvas_id: DEFAULT_CANVAS_ID.to_string(),
            antialias: true,
        }
    }
}

/// Whatever actually issues draw calls against the surface.
pub trait RenderBackend {
    /// Recompute viewport and back buffers for a surface of `size` pixels.
    fn resize(&mut self, size: SurfaceSize);

    /// Draw one frame.
    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()>;
}

type RenderCallback<B> = Box<dyn FnMut(&mut B)>;

struct RenderLoop<B> {
    callback: RenderCallback<B>,
    running: Rc<Cell<bool>>,
}

/// Halts the render loop it was returned for.
#[derive(Clone, Debug)]
pub struct RenderLoopHandle {
    running: Rc<Cell<bool>>,
}

impl RenderLoopHandle {
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

pub struct Engine<B> {
    surface: DrawableSurface,
    backend: B,
    options: EngineOptions,
    loader: SceneLoader,
    loops: Vec<RenderLoop<B>>,
    frames: u64,
}

impl<B> std::fmt::Debug for Engine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("surface", &self.surface)
            .field("options", &self.options)
            .field("loader", &self.loader)
            .field("render_loops", &self.loops.len())
            .field("frames", &self.frames)
            .finish()
    }
}

impl<B: RenderBackend> Engine<B> {
    /// Take ownership of `surface` and the `backend` bound to it. The default
    /// loader plugins are registered here.
    pub fn new(surface: DrawableSurface, backend: B, options: EngineOptions) -> Self {
        log::info!(
            "engine bound to surface `{}` ({}), antialias: {}",
            surface.id(),
            surface.size(),
            options.antialias
        );
        Self {
            surface,
            backend,
            options,
            loader: SceneLoader::with_default_plugins(),
            loops: Vec::new(),
            frames: 0,
        }
    }

    pub fn surface(&self) -> &DrawableSurface {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut DrawableSurface {
        &mut self.surface
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn loader(&self) -> &SceneLoader {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut SceneLoader {
        &mut self.loader
    }

    /// Number of frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn active_render_loops(&self) -> usize {
        self.loops.iter().filter(|l| l.running.get()).count()
    }

    /// Tell the backend the surface changed size.
    pub fn resize(&mut self) {
        log::debug!("resizing engine to {}", self.surface.size());
        self.backend.resize(self.surface.size());
    }

    /// Register `callback` to run once per frame until the returned handle is stopped.
    pub fn run_render_loop<F>(&mut self, callback: F) -> RenderLoopHandle
    where
        F: FnMut(&mut B) + 'static,
    {
        let running = Rc::new(Cell::new(true));
        self.loops.push(RenderLoop {
            callback: Box::new(callback),
            running: running.clone(),
        });
        RenderLoopHandle { running }
    }

    /// Halt every registered render loop.
    pub fn stop_render_loop(&mut self) {
        self.loops.iter().for_each(|l| l.running.set(false));
        self.loops.clear();
    }

    /// Run every active render loop once, in registration order.
    pub fn run_frame(&mut self) {
        self.loops.retain(|l| l.running.get());
        for render_loop in self.loops.iter_mut() {
            // A callback may stop a loop registered after it.
            if render_loop.running.get() {
                (render_loop.callback)(&mut self.backend);
            }
        }
        self.frames += 1;
    }
}
