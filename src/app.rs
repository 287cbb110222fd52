//! The winit event loop driving the bootstrapper.
//!
//! [`App`] is the host side of the application: it owns the event loop
//! integration and translates winit's window and device events into
//! [`HostEvent`]s for the [`Bootstrapper`]. Redraws are requested continuously,
//! so `RedrawRequested` acts as the per-frame display callback.
//!
//! # Lifecycle
//!
//! 1. `resumed` runs [`Bootstrapper::initialize`] with a [`WinitHost`], creating
//!    the window (a canvas on the web) and the GPU context, then fires `Load`
//! 2. `Resized` fires `Resize`
//! 3. `RedrawRequested` fires `Frame` and requests the next redraw
//! 4. keyboard, mouse button and mouse motion events fire `Input`
//!
//! On wasm32 the GPU context cannot be awaited in place; it is created on a
//! local future and delivered back through the event loop proxy.

use std::sync::Arc;

use anyhow::anyhow;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowId,
};

use crate::{
    bootstrap::Bootstrapper,
    camera::{ControlInput, ControlKey},
    context::{Context, WgpuBackend},
    engine::EngineOptions,
    host::{HostEvent, WinitHost},
};

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    ContextReady(Context),
    #[allow(dead_code)]
    ContextFailed(String),
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextReady(_) => f.write_str("ContextReady"),
            Self::ContextFailed(e) => f.debug_tuple("ContextFailed").field(e).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<AppEvent>,
    options: EngineOptions,
    bootstrapper: Option<Bootstrapper<WinitHost, WgpuBackend>>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, options: EngineOptions) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            options,
            bootstrapper: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("App initialization failed: {:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn request_redraw(&self) {
        if let Some(window) = self.bootstrapper.as_ref().and_then(|b| b.host().window()) {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.bootstrapper.is_some() {
            return;
        }

        let options = self.options.clone();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = &self.async_runtime;
        #[cfg(target_arch = "wasm32")]
        let proxy = self.proxy.clone();

        let result = Bootstrapper::initialize(
            WinitHost::new(),
            self.options.clone(),
            |host: &mut WinitHost, attributes| {
                let window = Arc::new(event_loop.create_window(attributes)?);
                host.bind_window(window.clone());

                #[cfg(not(target_arch = "wasm32"))]
                {
                    let context = async_runtime.block_on(Context::new(window, &options))?;
                    Ok(WgpuBackend::ready(context))
                }

                #[cfg(target_arch = "wasm32")]
                {
                    wasm_bindgen_futures::spawn_local(async move {
                        let event = match Context::new(window, &options).await {
                            Ok(context) => AppEvent::ContextReady(context),
                            Err(e) => AppEvent::ContextFailed(format!("{:#}", e)),
                        };
                        if proxy.send_event(event).is_err() {
                            log::error!("event loop closed before the GPU context was ready");
                        }
                    });
                    Ok(WgpuBackend::pending())
                }
            },
        );

        match result {
            Ok(mut bootstrapper) => {
                bootstrapper.handle_event(HostEvent::Load);
                self.bootstrapper = Some(bootstrapper);
                self.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ContextReady(context) => {
                if let Some(bootstrapper) = &mut self.bootstrapper {
                    bootstrapper.engine_mut().backend_mut().attach(context);
                    bootstrapper.handle_event(HostEvent::Resize);
                }
                self.request_redraw();
            }
            AppEvent::ContextFailed(message) => self.fail(event_loop, anyhow!(message)),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(bootstrapper) = &mut self.bootstrapper else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            bootstrapper.handle_event(HostEvent::Input(ControlInput::PointerMotion { dx, dy }));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(bootstrapper) = &mut self.bootstrapper else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) => bootstrapper.handle_event(HostEvent::Resize),
            WindowEvent::RedrawRequested => {
                bootstrapper.handle_event(HostEvent::Frame);
                self.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(input) = key_input(&event) {
                    bootstrapper.handle_event(HostEvent::Input(input));
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => bootstrapper.handle_event(HostEvent::Input(ControlInput::PointerButton {
                pressed: state.is_pressed(),
            })),
            _ => {}
        }
    }
}

/// Arrow keys and WASD move the camera.
fn key_input(event: &KeyEvent) -> Option<ControlInput> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let key = match code {
        KeyCode::ArrowUp | KeyCode::KeyW => ControlKey::Forward,
        KeyCode::ArrowDown | KeyCode::KeyS => ControlKey::Backward,
        KeyCode::ArrowLeft | KeyCode::KeyA => ControlKey::Left,
        KeyCode::ArrowRight | KeyCode::KeyD => ControlKey::Right,
        _ => return None,
    };
    Some(ControlInput::Key {
        key,
        pressed: event.state.is_pressed(),
    })
}

/// Initialise logging, open the surface and run until the window closes.
///
/// Setup failures end the event loop and are returned here.
pub fn run(options: EngineOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info)?;
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, options)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
