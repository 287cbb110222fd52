//! What a scene hands to the render backend each frame.
//!
//! A [`Frame`] borrows everything from the scene; the backend decides how to
//! turn it into draw calls (and caches whatever GPU resources it needs).

use crate::{
    camera::{CameraUniform, FreeCamera},
    data_structures::{mesh::Mesh, scene::HemisphericLight},
    pipelines::light::LightUniform,
};

pub struct Frame<'a> {
    pub camera: &'a FreeCamera,
    pub light: &'a HemisphericLight,
    pub meshes: &'a [Mesh],
    pub clear_colour: wgpu::Color,
}

impl<'a> Frame<'a> {
    pub fn camera_uniform(&self, aspect: f32) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(self.camera, aspect);
        uniform
    }

    pub fn light_uniform(&self) -> LightUniform {
        LightUniform::from(self.light)
    }

    /// Meshes that actually produce triangles. Empty ones are reported when
    /// added to a scene, not here.
    pub fn drawable_meshes(&self) -> impl Iterator<Item = &'a Mesh> + 'a {
        self.meshes
            .iter()
            .filter(|mesh| !mesh.geometry.indices.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_structures::mesh::{Geometry, MeshShape},
        resources::mesh::{MeshBuilder, SphereOptions},
    };

    #[test]
    fn meshes_without_triangles_are_not_drawn() {
        let camera = FreeCamera::new("freeCamera", (0.0, 0.0, 5.0));
        let light = HemisphericLight::new("skyLight", (0.0, 1.0, 0.0));
        let meshes = vec![
            Mesh::new(
                "empty",
                MeshShape::Imported {
                    source: "empty.obj".to_string(),
                },
                Geometry::default(),
            ),
            MeshBuilder::create_sphere("sphere", SphereOptions::default()),
        ];
        let frame = Frame {
            camera: &camera,
            light: &light,
            meshes: &meshes,
            clear_colour: wgpu::Color::BLACK,
        };

        let drawn: Vec<_> = frame.drawable_meshes().map(|m| m.name.as_str()).collect();
        assert_eq!(drawn, vec!["sphere"]);
        // Every call yields the same set.
        assert_eq!(frame.drawable_meshes().count(), 1);
    }
}
