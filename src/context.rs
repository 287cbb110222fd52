//! GPU context and the wgpu render backend.
//!
//! [`Context`] owns everything wgpu needs to draw a [`Frame`]: device, queue,
//! configured surface, depth and multisample targets, camera and light
//! uniforms, the scene pipeline and the uploaded meshes. [`WgpuBackend`] wraps
//! it as the engine's [`RenderBackend`]; because acquiring a device is async
//! (and cannot block on the web) the backend may exist before its context does.

use std::{collections::HashMap, iter, sync::Arc};

use anyhow::anyhow;
use bytemuck::Zeroable;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::CameraUniform,
    data_structures::texture::Texture,
    engine::{EngineOptions, RenderBackend},
    pipelines::{
        basic::mk_scene_pipeline,
        light::{LightResources, LightUniform},
    },
    render::Frame,
    resources::mesh::GpuMesh,
    surface::SurfaceSize,
};

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub(crate) sample_count: u32,
    pub(crate) depth_texture: Texture,
    pub(crate) multisampled_framebuffer: Option<Texture>,
    pub camera_uniform: CameraUniform,
    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
    pub light: LightResources,
    pub pipeline: wgpu::RenderPipeline,
    meshes: HashMap<u32, GpuMesh>,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, options: &EngineOptions) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader assumes an sRGB surface; anything else comes out darker.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("the surface is incompatible with the adapter"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let requested = options.sample_count();
        let sample_count = if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(requested)
        {
            requested
        } else {
            log::warn!("{}x multisampling is not supported for {:?}", requested, surface_format);
            1
        };

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let light = LightResources::new(LightUniform::zeroed(), &device);

        let pipeline = mk_scene_pipeline(
            &device,
            &config,
            sample_count,
            &camera_bind_group_layout,
            &light.bind_group_layout,
        );

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            sample_count,
            "depth_texture",
        );

        let mut ctx = Self {
            window,
            surface,
            device,
            queue,
            config,
            sample_count,
            depth_texture,
            multisampled_framebuffer: None,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            light,
            pipeline,
            meshes: HashMap::new(),
            is_surface_configured: false,
        };
        ctx.resize(SurfaceSize::new(size.width, size.height));
        Ok(ctx)
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Reconfigure the swapchain and recreate the size-dependent targets.
    /// Zero-sized surfaces are ignored.
    pub fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = Texture::create_depth_texture(
            &self.device,
            [size.width, size.height],
            self.sample_count,
            "depth_texture",
        );
        self.multisampled_framebuffer = (self.sample_count > 1).then(|| {
            Texture::create_multisampled_framebuffer(
                &self.device,
                [size.width, size.height],
                self.sample_count,
                self.config.format,
            )
        });
        self.is_surface_configured = true;
    }

    fn aspect(&self) -> f32 {
        SurfaceSize::new(self.config.width, self.config.height).aspect()
    }

    pub fn render(&mut self, frame: &Frame<'_>) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.camera_uniform = frame.camera_uniform(self.aspect());
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
        self.light.write(&self.queue, frame.light_uniform());
        for mesh in frame.meshes {
            self.meshes
                .entry(mesh.id())
                .or_insert_with(|| GpuMesh::upload(&self.device, mesh));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (target, resolve_target) = match &self.multisampled_framebuffer {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_bind_group(1, &self.light.bind_group, &[]);
            for mesh in frame.drawable_meshes() {
                let Some(gpu) = self.meshes.get(&mesh.id()) else {
                    continue;
                };
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.num_elements, 0, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// The production [`RenderBackend`]. Draws are skipped until a [`Context`] is attached.
#[derive(Debug, Default)]
pub struct WgpuBackend {
    context: Option<Context>,
    pending_size: Option<SurfaceSize>,
}

impl WgpuBackend {
    /// A backend still waiting for its GPU context.
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn ready(context: Context) -> Self {
        Self {
            context: Some(context),
            pending_size: None,
        }
    }

    /// Hand over the GPU context, replaying the last resize that arrived without one.
    pub fn attach(&mut self, mut context: Context) {
        if let Some(size) = self.pending_size.take() {
            context.resize(size);
        }
        log::info!("GPU context attached ({}x MSAA)", context.sample_count());
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.context.is_some()
    }
}

impl RenderBackend for WgpuBackend {
    fn resize(&mut self, size: SurfaceSize) {
        match &mut self.context {
            Some(ctx) => ctx.resize(size),
            None => self.pending_size = Some(size),
        }
    }

    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
        let Some(ctx) = &mut self.context else {
            return Ok(());
        };
        match ctx.render(frame) {
            Ok(()) => Ok(()),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.window.inner_size().into();
                ctx.resize(size);
                Ok(())
            }
            Err(e) => Err(anyhow!("unable to render: {}", e)),
        }
    }
}
