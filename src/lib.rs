//! flow-scene
//!
//! Bootstraps a minimal 3D scene on top of wgpu and keeps it rendering. The
//! crate creates a drawable surface (a `<canvas id="gameCanvas">` on the web,
//! a window natively), binds an engine to it, builds a scene with a free
//! camera, a hemispheric light, a sphere and a ground plane, and runs the
//! render loop until the host goes away. The surface always tracks the host
//! viewport size.
//!
//! High-level modules
//! - `app`: winit event loop feeding host events to the bootstrapper
//! - `bootstrap`: surface, engine, scene and render loop wiring
//! - `camera`: free camera, its input controls and uniforms
//! - `context`: GPU context owning device, queue, surface and pipelines
//! - `data_structures`: scene, mesh, instance and texture models
//! - `engine`: the engine, its options and the render backend seam
//! - `host`: host capabilities (surface creation, viewport size) and events
//! - `pipelines`: the scene pipeline and light uniforms
//! - `render`: per-frame draw data
//! - `resources`: procedural meshes and the mesh loader plugins
//! - `surface`: the drawable surface and its size
//!

pub mod app;
pub mod bootstrap;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod engine;
pub mod host;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod surface;

// Re-exports commonly used types for convenience in downstream code.
pub use bootstrap::Bootstrapper;
pub use engine::{EngineOptions, RenderBackend};
pub use host::{Host, HostEvent};
pub use surface::{DrawableSurface, SurfaceSize};
pub use cgmath;
pub use wgpu;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    app::run(EngineOptions::default())
        .map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}
