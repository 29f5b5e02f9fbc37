use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets::TextureProvider;
use crate::audio::LogAudio;
use crate::config::TourConfig;
use crate::gpu::{GpuContext, GpuError};
use crate::input::{Command, Input};
use crate::quality::{DeviceProfile, QualityAdapter};
use crate::render::Renderer;
use crate::state::ApplicationState;

/// Why the tour could not run.
#[derive(Debug)]
pub enum RunError {
    EventLoop(EventLoopError),
    Window(OsError),
    Gpu(GpuError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::EventLoop(e) => write!(f, "event loop error: {}", e),
            RunError::Window(e) => write!(f, "could not create window: {}", e),
            RunError::Gpu(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::EventLoop(e) => Some(e),
            RunError::Window(e) => Some(e),
            RunError::Gpu(e) => Some(e),
        }
    }
}

impl From<EventLoopError> for RunError {
    fn from(e: EventLoopError) -> Self {
        RunError::EventLoop(e)
    }
}

impl From<OsError> for RunError {
    fn from(e: OsError) -> Self {
        RunError::Window(e)
    }
}

impl From<GpuError> for RunError {
    fn from(e: GpuError) -> Self {
        RunError::Gpu(e)
    }
}

/// Open a window and run the tour until it is closed.
///
/// # Example
/// ```no_run
/// stellar::run(stellar::TourConfig::new().title("Night Sky"))?;
/// # Ok::<(), stellar::RunError>(())
/// ```
pub fn run(config: TourConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = TourApp::Pending {
        config,
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app {
        TourApp::Pending {
            error: Some(error), ..
        } => Err(error),
        _ => Ok(()),
    }
}

enum TourApp {
    Pending {
        config: TourConfig,
        /// Set when start-up failed; the event loop exits right after.
        error: Option<RunError>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        renderer: Renderer,
        state: ApplicationState,
        input: Input,
        title: String,
        start_time: Instant,
        last_frame: Instant,
    },
}

impl TourApp {
    fn start(config: &TourConfig, event_loop: &ActiveEventLoop) -> Result<Self, RunError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let quality = match config.quality {
            Some(tier) => QualityAdapter::new(tier),
            None => QualityAdapter::detect(&DeviceProfile::from_adapter_info(&gpu.adapter_info)),
        };
        info!(
            target: "stellar::app",
            "{} ({:?}), quality {:?}",
            gpu.adapter_info.name,
            gpu.adapter_info.backend,
            quality.tier()
        );

        let state = ApplicationState::new(
            config.clone(),
            quality,
            gpu.width(),
            gpu.height(),
            Box::new(LogAudio::new()),
        );
        let mut textures = TextureProvider::new(config.texture_dir.clone());
        let renderer = Renderer::new(&gpu, &state, &mut textures);

        let title = state.label.window_title(&config.title);
        window.set_title(&title);

        Ok(TourApp::Running {
            window,
            gpu,
            renderer,
            state,
            input: Input::new(),
            title,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }
}

impl ApplicationHandler for TourApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let TourApp::Pending { config, error } = self else {
            return;
        };
        match TourApp::start(config, event_loop) {
            Ok(running) => *self = running,
            Err(e) => {
                *error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let TourApp::Running { state, .. } = self {
            state.pipeline.dispose();
            info!(target: "stellar::app", "tour closed");
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let TourApp::Running {
            window,
            gpu,
            renderer,
            state,
            input,
            title,
            start_time,
            last_frame,
        } = self
        else {
            return;
        };

        if let Some(command) = input.handle_event(&event) {
            state.note_input();
            if let Some(command) = command {
                apply_command(state, command, event_loop);
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
                state.resize(gpu.width(), gpu.height());
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let time = start_time.elapsed().as_secs_f32();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                state.tick(time, dt);

                let next_title = state.label.window_title(&state.config.title);
                if next_title != *title {
                    window.set_title(&next_title);
                    *title = next_title;
                }

                match renderer.render(gpu, state) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.reconfigure();
                    }
                    Err(e) => warn!(target: "stellar::app", "skipping frame: {}", e),
                }

                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn apply_command(state: &mut ApplicationState, command: Command, event_loop: &ActiveEventLoop) {
    match command {
        Command::Jump(scene) => {
            state.request_transition(scene);
        }
        Command::Next => {
            state.next();
        }
        Command::Previous => {
            state.previous();
        }
        Command::ToggleAutoAdvance => state.toggle_auto_advance(),
        Command::ResetScene => state.reset_active_scene(),
        Command::Pick(at) => {
            let ray = state.picking_ray(at.x, at.y);
            state.interact(ray);
        }
        Command::Exit => event_loop.exit(),
    }
}
