//! Helpers that produce geometry and GPU resources.
//!
//! - `mesh` tessellates primitive shapes and uploads meshes to the GPU
//! - `loader` imports meshes from model files through registered plugins

pub mod loader;
pub mod mesh;
