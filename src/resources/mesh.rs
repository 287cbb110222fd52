//! Procedural mesh construction and GPU upload.
//!
//! [`MeshBuilder`] tessellates the primitive shapes the scene needs. Geometry
//! is built on the CPU so it can be inspected and tested without a device;
//! [`GpuMesh::upload`] turns it into vertex, index and instance buffers.

use std::f32::consts::{PI, TAU};

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::InstanceRaw,
    mesh::{Geometry, Mesh, MeshShape, MeshVertex},
};

/// Shape options for [`MeshBuilder::create_sphere`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereOptions {
    pub segments: u32,
    pub diameter: f32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            segments: 32,
            diameter: 1.0,
        }
    }
}

/// Shape options for [`MeshBuilder::create_ground`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundOptions {
    pub width: f32,
    pub height: f32,
    pub subdivisions: u32,
}

impl Default for GroundOptions {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            subdivisions: 1,
        }
    }
}

pub struct MeshBuilder;

impl MeshBuilder {
    /// UV sphere centred at the origin.
    ///
    /// `segments` controls the tessellation: the sphere is cut into
    /// `segments + 2` latitude bands and twice as many longitude slices.
    pub fn create_sphere(name: &str, options: SphereOptions) -> Mesh {
        let bands = options.segments.max(1) + 2;
        let slices = 2 * bands;
        let radius = options.diameter / 2.0;

        let mut vertices = Vec::with_capacity(((bands + 1) * (slices + 1)) as usize);
        for band in 0..=bands {
            let v = band as f32 / bands as f32;
            let theta = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let phi = u * TAU;
                let normal = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
                vertices.push(MeshVertex {
                    position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                    normal,
                    tex_coords: [u, v],
                });
            }
        }

        // Counter-clockwise seen from outside. The first band has a degenerate
        // upper triangle, the last band a degenerate lower one.
        let row = slices + 1;
        let mut indices = Vec::with_capacity((6 * slices * (bands - 1)) as usize);
        for band in 0..bands {
            for slice in 0..slices {
                let a = band * row + slice;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                if band != 0 {
                    indices.extend_from_slice(&[a, b, c]);
                }
                if band != bands - 1 {
                    indices.extend_from_slice(&[b, d, c]);
                }
            }
        }

        Mesh::new(
            name,
            MeshShape::Sphere {
                segments: options.segments,
                diameter: options.diameter,
            },
            Geometry { vertices, indices },
        )
    }

    /// Flat grid in the XZ plane, centred at the origin, facing +Y.
    pub fn create_ground(name: &str, options: GroundOptions) -> Mesh {
        let subdivisions = options.subdivisions.max(1);
        let row = subdivisions + 1;

        let mut vertices = Vec::with_capacity((row * row) as usize);
        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let u = x as f32 / subdivisions as f32;
                let v = z as f32 / subdivisions as f32;
                vertices.push(MeshVertex {
                    position: [
                        u * options.width - options.width / 2.0,
                        0.0,
                        v * options.height - options.height / 2.0,
                    ],
                    normal: [0.0, 1.0, 0.0],
                    tex_coords: [u, 1.0 - v],
                });
            }
        }

        let mut indices = Vec::with_capacity((6 * subdivisions * subdivisions) as usize);
        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let a = z * row + x;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Mesh::new(
            name,
            MeshShape::Ground {
                width: options.width,
                height: options.height,
                subdivisions: options.subdivisions,
            },
            Geometry { vertices, indices },
        )
    }
}

/// A mesh's buffers on the GPU.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance: InstanceRaw = mesh.transform.to_raw(mesh.colour);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[instance]),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_elements: mesh.geometry.indices.len() as u32,
        }
    }
}
