//! Loader plugins for importing meshes from model files.
//!
//! A [`SceneLoader`] dispatches on the file extension to the registered
//! [`LoaderPlugin`]. The engine registers the OBJ and glTF plugins when it is
//! constructed, so any scene can import meshes without further setup.

use std::io::{BufReader, Cursor};

use anyhow::{Context as _, anyhow, bail};

use crate::data_structures::mesh::{Geometry, Mesh, MeshShape, MeshVertex};

/// Turns the bytes of one model file into meshes.
pub trait LoaderPlugin {
    fn name(&self) -> &str;

    /// Lower-case file extensions (without the dot) this plugin handles.
    fn extensions(&self) -> &[&'static str];

    fn import_meshes(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<Vec<Mesh>>;
}

/// Registry of loader plugins keyed by file extension.
#[derive(Default)]
pub struct SceneLoader {
    plugins: Vec<Box<dyn LoaderPlugin>>,
}

impl std::fmt::Debug for SceneLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|plugin| plugin.name()))
            .finish()
    }
}

impl SceneLoader {
    /// A loader with the OBJ and glTF plugins registered.
    pub fn with_default_plugins() -> Self {
        let mut loader = Self::default();
        loader.register_plugin(Box::new(ObjLoader));
        loader.register_plugin(Box::new(GltfLoader));
        loader
    }

    /// Register `plugin`. Later registrations win for shared extensions.
    pub fn register_plugin(&mut self, plugin: Box<dyn LoaderPlugin>) {
        log::debug!("registered loader plugin `{}` for {:?}", plugin.name(), plugin.extensions());
        self.plugins.push(plugin);
    }

    pub fn plugin_for(&self, file_name: &str) -> Option<&dyn LoaderPlugin> {
        let extension = std::path::Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        self.plugins
            .iter()
            .rev()
            .find(|plugin| plugin.extensions().contains(&extension.as_str()))
            .map(|plugin| plugin.as_ref())
    }

    pub fn import_meshes(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<Vec<Mesh>> {
        let plugin = self
            .plugin_for(file_name)
            .with_context(|| format!("no loader plugin registered for `{}`", file_name))?;
        let meshes = plugin
            .import_meshes(file_name, bytes)
            .with_context(|| format!("plugin `{}` failed to load `{}`", plugin.name(), file_name))?;
        log::info!("imported {} meshes from `{}`", meshes.len(), file_name);
        Ok(meshes)
    }
}

fn imported(name: String, file_name: &str, mut geometry: Geometry, has_normals: bool) -> Mesh {
    if !has_normals {
        geometry.compute_normals();
    }
    Mesh::new(
        &name,
        MeshShape::Imported {
            source: file_name.to_string(),
        },
        geometry,
    )
}

/// Wavefront OBJ. Materials are ignored.
pub struct ObjLoader;

impl LoaderPlugin for ObjLoader {
    fn name(&self) -> &str {
        "obj"
    }

    fn extensions(&self) -> &[&'static str] {
        &["obj"]
    }

    fn import_meshes(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<Vec<Mesh>> {
        let mut reader = BufReader::new(Cursor::new(bytes));
        let (models, _) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
            |_| Err(tobj::LoadError::GenericFailure),
        )?;

        let meshes = models
            .into_iter()
            .map(|m| {
                let has_normals = m.mesh.normals.len() == m.mesh.positions.len();
                let vertices = (0..m.mesh.positions.len() / 3)
                    .map(|i| MeshVertex {
                        position: [
                            m.mesh.positions[i * 3],
                            m.mesh.positions[i * 3 + 1],
                            m.mesh.positions[i * 3 + 2],
                        ],
                        normal: [
                            m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                            m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                        ],
                        tex_coords: [
                            m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                            1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                        ],
                    })
                    .collect();
                let geometry = Geometry {
                    vertices,
                    indices: m.mesh.indices,
                };
                imported(m.name, file_name, geometry, has_normals)
            })
            .collect();
        Ok(meshes)
    }
}

/// Binary glTF (`.glb`) and glTF with the buffer embedded in the GLB chunk.
pub struct GltfLoader;

impl LoaderPlugin for GltfLoader {
    fn name(&self) -> &str {
        "gltf"
    }

    fn extensions(&self) -> &[&'static str] {
        &["gltf", "glb"]
    }

    fn import_meshes(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<Vec<Mesh>> {
        let gltf = gltf::Gltf::from_slice(bytes)?;

        let mut buffer_data: Vec<Vec<u8>> = Vec::new();
        for buffer in gltf.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    let blob = gltf
                        .blob
                        .as_deref()
                        .ok_or_else(|| anyhow!("buffer {} refers to a missing GLB chunk", buffer.index()))?;
                    buffer_data.push(blob.into());
                }
                gltf::buffer::Source::Uri(uri) => {
                    bail!("external buffer `{}` is not supported", uri);
                }
            }
        }

        let mut meshes = Vec::new();
        for mesh in gltf.meshes() {
            let mesh_name = mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh{}", mesh.index()));
            for (idx, primitive) in mesh.primitives().enumerate() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!("skipping non-triangle primitive {} of `{}`", idx, mesh_name);
                    continue;
                }
                let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

                let mut vertices: Vec<MeshVertex> = reader
                    .read_positions()
                    .with_context(|| format!("primitive {} of `{}` has no positions", idx, mesh_name))?
                    .map(|position| MeshVertex {
                        position,
                        normal: [0.0; 3],
                        tex_coords: [0.0; 2],
                    })
                    .collect();

                let mut has_normals = false;
                if let Some(normals) = reader.read_normals() {
                    has_normals = true;
                    vertices
                        .iter_mut()
                        .zip(normals)
                        .for_each(|(vertex, normal)| vertex.normal = normal);
                }
                if let Some(tex_coords) = reader.read_tex_coords(0) {
                    vertices
                        .iter_mut()
                        .zip(tex_coords.into_f32())
                        .for_each(|(vertex, uv)| vertex.tex_coords = uv);
                }

                let indices = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..vertices.len() as u32).collect(),
                };

                let name = if idx == 0 {
                    mesh_name.clone()
                } else {
                    format!("{}.{}", mesh_name, idx)
                };
                meshes.push(imported(name, file_name, Geometry { vertices, indices }, has_normals));
            }
        }
        Ok(meshes)
    }
}
