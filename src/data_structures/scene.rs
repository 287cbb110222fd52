//! The scene graph: one camera, one light and the meshes rendered with them.
//!
//! A [`Scene`] only comes out of [`SceneBuilder::build`], which refuses to
//! produce a scene without a camera and a light. After that the scene is
//! read-only; the only thing that still moves is the camera pose, driven by its
//! attached controls.

use anyhow::Context as _;
use cgmath::{InnerSpace, Vector3};

use crate::{
    camera::FreeCamera,
    data_structures::mesh::Mesh,
    engine::RenderBackend,
    render::Frame,
};

/// Sky/ground ambient light: surfaces facing `direction` get `diffuse`,
/// surfaces facing away get `ground_colour`, with a smooth blend in between.
#[derive(Clone, Debug, PartialEq)]
pub struct HemisphericLight {
    pub name: String,
    pub direction: Vector3<f32>,
    pub diffuse: [f32; 3],
    pub ground_colour: [f32; 3],
    pub intensity: f32,
}

impl HemisphericLight {
    pub fn new<V: Into<Vector3<f32>>>(name: &str, direction: V) -> Self {
        Self {
            name: name.to_string(),
            direction: direction.into(),
            diffuse: [1.0, 1.0, 1.0],
            ground_colour: [0.0, 0.0, 0.0],
            intensity: 1.0,
        }
    }

    /// Unit direction towards the sky, or +Y if the configured direction is zero.
    pub fn normalized_direction(&self) -> Vector3<f32> {
        if self.direction.magnitude2() > 0.0 {
            self.direction.normalize()
        } else {
            Vector3::unit_y()
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    camera: FreeCamera,
    light: HemisphericLight,
    meshes: Vec<Mesh>,
    clear_colour: wgpu::Color,
}

impl Scene {
    pub fn camera(&self) -> &FreeCamera {
        &self.camera
    }

    pub fn light(&self) -> &HemisphericLight {
        &self.light
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn clear_colour(&self) -> wgpu::Color {
        self.clear_colour
    }

    /// Draw one frame of this scene through `backend`.
    pub fn render<B: RenderBackend + ?Sized>(&self, backend: &mut B) -> anyhow::Result<()> {
        let frame = Frame {
            camera: &self.camera,
            light: &self.light,
            meshes: &self.meshes,
            clear_colour: self.clear_colour,
        };
        backend.draw(&frame)
    }
}

/// Collects the parts of a scene and assembles them in one step.
#[derive(Debug)]
pub struct SceneBuilder {
    camera: Option<FreeCamera>,
    light: Option<HemisphericLight>,
    meshes: Vec<Mesh>,
    clear_colour: wgpu::Color,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self {
            camera: None,
            light: None,
            meshes: Vec::new(),
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
        }
    }

    pub fn with_camera(mut self, camera: FreeCamera) -> Self {
        if let Some(previous) = self.camera.replace(camera) {
            log::warn!("camera `{}` was replaced before the scene was built", previous.name());
        }
        self
    }

    pub fn with_light(mut self, light: HemisphericLight) -> Self {
        if let Some(previous) = self.light.replace(light) {
            log::warn!("light `{}` was replaced before the scene was built", previous.name);
        }
        self
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        if mesh.geometry.indices.is_empty() {
            log::warn!("mesh `{}` has no triangles and will not be drawn", mesh.name);
        }
        self.meshes.push(mesh);
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn build(self) -> anyhow::Result<Scene> {
        let camera = self.camera.context("a scene needs a camera before it can render")?;
        let light = self.light.context("a scene needs a light before it can render")?;
        log::debug!(
            "built scene with camera `{}`, light `{}` and {} meshes",
            camera.name(),
            light.name,
            self.meshes.len()
        );
        Ok(Scene {
            camera,
            light,
            meshes: self.meshes,
            clear_colour: self.clear_colour,
        })
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::mesh::{Geometry, MeshShape};

    fn mesh(name: &str) -> Mesh {
        Mesh::new(
            name,
            MeshShape::Imported {
                source: "test".to_string(),
            },
            Geometry::default(),
        )
    }

    #[test]
    fn building_without_camera_fails() {
        let result = SceneBuilder::new()
            .with_light(HemisphericLight::new("skyLight", (0.0, 1.0, 0.0)))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn building_without_light_fails() {
        let result = SceneBuilder::new()
            .with_camera(FreeCamera::new("freeCamera", (0.0, 0.0, 5.0)))
            .build();
        assert!(result.is_err());
    }

    fn scene_with(meshes: &[&str]) -> Scene {
        meshes
            .iter()
            .fold(
                SceneBuilder::new()
                    .with_camera(FreeCamera::new("freeCamera", (0.0, 0.0, 5.0)))
                    .with_light(HemisphericLight::new("skyLight", (0.0, 1.0, 0.0))),
                |builder, name| builder.with_mesh(mesh(name)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn meshes_are_found_by_name() {
        let scene = scene_with(&["a", "b"]);
        let a = scene.mesh("a").map(Mesh::id);
        let b = scene.mesh("b").map(Mesh::id);
        assert!(a.is_some() && b.is_some());
        assert_ne!(a, b);
        assert!(scene.mesh("c").is_none());
    }

    #[test]
    fn meshes_of_separate_scenes_never_share_ids() {
        let first = scene_with(&["sphere"]);
        let second = scene_with(&["groundPlane"]);
        assert_ne!(first.meshes()[0].id(), second.meshes()[0].id());
    }

    #[test]
    fn zero_light_direction_points_up() {
        let light = HemisphericLight::new("skyLight", (0.0, 0.0, 0.0));
        assert_eq!(light.normalized_direction(), Vector3::unit_y());
    }
}
