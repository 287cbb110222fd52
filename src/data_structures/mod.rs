//! Engine data structures: meshes, instances, render targets and the scene graph.
//!
//! - `mesh` holds vertex layout, CPU-side geometry and the mesh record
//! - `instance` holds the per-mesh world transform and its GPU layout
//! - `texture` holds the depth and multisample render targets
//! - `scene` holds the scene graph (camera, light, meshes) and its builder

pub mod instance;
pub mod mesh;
pub mod scene;
pub mod texture;
