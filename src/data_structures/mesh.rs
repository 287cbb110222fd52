//! Static geometry: vertex layout, CPU-side geometry and the mesh record.

use std::sync::atomic::{AtomicU32, Ordering};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::instance::Instance;

/// Vertex layout shared by every mesh the engine draws.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Replace all normals with area-weighted averages of the adjacent face normals.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for c in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
            let (Some(v0), Some(v1), Some(v2)) =
                (self.vertices.get(i0), self.vertices.get(i1), self.vertices.get(i2))
            else {
                log::warn!("triangle {:?} references a vertex out of range", c);
                continue;
            };
            let p0: Vector3<f32> = v0.position.into();
            let p1: Vector3<f32> = v1.position.into();
            let p2: Vector3<f32> = v2.position.into();
            // Not normalised: larger faces weigh more.
            let face = (p1 - p0).cross(p2 - p0);
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            vertex.normal = if normal.magnitude2() > 0.0 {
                normal.normalize().into()
            } else {
                [0.0, 1.0, 0.0]
            };
        }
    }
}

/// The parameters a mesh was built from.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshShape {
    Sphere { segments: u32, diameter: f32 },
    Ground { width: f32, height: f32, subdivisions: u32 },
    Imported { source: String },
}

static NEXT_MESH_ID: AtomicU32 = AtomicU32::new(0);

/// A named, immutable piece of geometry placed in the world.
#[derive(Clone, Debug)]
pub struct Mesh {
    id: u32,
    pub name: String,
    pub shape: MeshShape,
    pub geometry: Geometry,
    pub transform: Instance,
    pub colour: [f32; 3],
}

impl Mesh {
    pub fn new(name: &str, shape: MeshShape, geometry: Geometry) -> Self {
        Self {
            id: NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            shape,
            geometry,
            transform: Instance::new(),
            colour: [1.0, 1.0, 1.0],
        }
    }

    /// Process-wide identifier; GPU buffers are cached under it. Clones share it.
    pub fn id(&self) -> u32 {
        self.id
    }
}
