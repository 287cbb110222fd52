//! Application bootstrap: surface, engine, scene, host signals, render loop.
//!
//! [`Bootstrapper::initialize`] is the single entry point. It creates the
//! drawable surface through the [`Host`], binds a render backend to it, builds
//! the scene and registers the render loop. The returned bootstrapper is
//! running; from then on the host feeds it [`HostEvent`]s.

use std::rc::Rc;

use anyhow::Context as _;
use instant::Instant;

use crate::{
    camera::{CameraControls, FreeCamera},
    data_structures::scene::{HemisphericLight, Scene, SceneBuilder},
    engine::{Engine, EngineOptions, RenderBackend, RenderLoopHandle},
    host::{Host, HostEvent},
    resources::mesh::{GroundOptions, MeshBuilder, SphereOptions},
};

/// What [`build_scene`] hands back: the scene, the controls attached to its
/// camera and the handle of the loop rendering it.
pub struct SceneSetup {
    pub scene: Rc<Scene>,
    pub controls: CameraControls,
    pub render_loop: RenderLoopHandle,
}

/// Build the demo scene on `engine` and start rendering it every frame.
///
/// The render loop only holds a weak reference: once the scene is dropped the
/// loop stops drawing.
pub fn build_scene<B: RenderBackend + 'static>(engine: &mut Engine<B>) -> anyhow::Result<SceneSetup> {
    let mut camera = FreeCamera::new("freeCamera", (-10.0, 5.0, 3.0));
    let controls = camera.attach_control(engine.surface());
    camera.set_target((0.0, 0.0, 0.0));

    let light = HemisphericLight::new("skyLight", (0.0, 1.0, 0.0));
    let sphere = MeshBuilder::create_sphere(
        "sphere",
        SphereOptions {
            segments: 16,
            diameter: 2.0,
        },
    );
    let ground = MeshBuilder::create_ground(
        "groundPlane",
        GroundOptions {
            width: 6.0,
            height: 6.0,
            subdivisions: 2,
        },
    );

    let scene = Rc::new(
        SceneBuilder::new()
            .with_camera(camera)
            .with_light(light)
            .with_mesh(sphere)
            .with_mesh(ground)
            .build()?,
    );

    let weak_scene = Rc::downgrade(&scene);
    let render_loop = engine.run_render_loop(move |backend: &mut B| {
        if let Some(scene) = weak_scene.upgrade() {
            if let Err(e) = scene.render(backend) {
                log::error!("Unable to render {}", e);
            }
        }
    });

    Ok(SceneSetup {
        scene,
        controls,
        render_loop,
    })
}

pub struct Bootstrapper<H, B> {
    host: H,
    engine: Engine<B>,
    scene: Rc<Scene>,
    controls: CameraControls,
    render_loop: RenderLoopHandle,
    last_frame: Instant,
}

impl<H: Host, B: RenderBackend + 'static> Bootstrapper<H, B> {
    /// Create the surface, bind the engine to it via `connect` and build the scene.
    ///
    /// Any failure is fatal; nothing is retried.
    pub fn initialize<F>(mut host: H, options: EngineOptions, connect: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut H, H::Target) -> anyhow::Result<B>,
    {
        let (surface, target) = host
            .create_surface(&options.canvas_id)
            .context("could not create the drawable surface")?;
        let backend = connect(&mut host, target)
            .context("could not bind the render engine to the surface")?;
        let mut engine = Engine::new(surface, backend, options);

        let SceneSetup {
            scene,
            controls,
            render_loop,
        } = build_scene(&mut engine)?;
        log::info!("scene is running on `{}`", engine.surface().id());

        Ok(Self {
            host,
            engine,
            scene,
            controls,
            render_loop,
            last_frame: Instant::now(),
        })
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Load => {
                self.sync_surface_size();
                // Time spent setting up is not camera movement.
                self.last_frame = Instant::now();
            }
            HostEvent::Resize => {
                self.sync_surface_size();
                self.engine.resize();
            }
            HostEvent::Frame => {
                let dt = self.last_frame.elapsed();
                self.last_frame = Instant::now();
                self.controls.update(self.scene.camera(), dt);
                self.engine.run_frame();
            }
            HostEvent::Input(input) => {
                self.controls.handle_input(input);
            }
        }
    }

    /// Make the surface as large as the host viewport.
    fn sync_surface_size(&mut self) {
        let size = self.host.inner_size();
        self.engine.surface_mut().set_size(size);
        self.host.apply_surface_size(self.engine.surface());
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn engine(&self) -> &Engine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<B> {
        &mut self.engine
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn render_loop(&self) -> &RenderLoopHandle {
        &self.render_loop
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }
}
