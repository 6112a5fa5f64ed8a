//! Camera Bubble - Main Entry Point
//!
//! A small frameless always-on-top window showing the webcam feed as a
//! circle. The event loop drives one acquire/process/display cycle every
//! 30 ms tick; dragging anywhere moves the window, hovering reveals the
//! controls.

use std::sync::Arc;
use std::time::Instant;

use camera_bubble::camera::CameraGrabber;
use camera_bubble::ticker::{Ticker, TICK_PERIOD};
use camera_bubble::App;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

const WINDOW_TITLE: &str = "Camera Bubble";
const WINDOW_SIZE: f64 = 220.0;
const CAMERA_INDEX: u32 = 0;

/// Application state machine
enum AppState {
    /// Initial state before the window is created
    Uninitialized,
    /// Window and graphics context are ready
    Running { window: Arc<Window>, app: App },
}

/// Main application handler implementing winit's ApplicationHandler trait
struct BubbleApp {
    state: AppState,
    /// Capture device opened before the loop starts, handed to the App on
    /// window creation
    grabber: Option<CameraGrabber>,
    ticker: Ticker,
}

impl BubbleApp {
    fn new(grabber: CameraGrabber) -> Self {
        Self {
            state: AppState::Uninitialized,
            grabber: Some(grabber),
            ticker: Ticker::new(TICK_PERIOD),
        }
    }
}

impl ApplicationHandler for BubbleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only initialize if we haven't already
        if let AppState::Uninitialized = &self.state {
            let Some(grabber) = self.grabber.take() else {
                return;
            };

            log::info!("Creating window...");

            let window_attributes = WindowAttributes::default()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(WINDOW_SIZE, WINDOW_SIZE))
                .with_decorations(false)
                .with_transparent(true)
                .with_resizable(false)
                .with_window_level(WindowLevel::AlwaysOnTop);

            let window = Arc::new(
                event_loop
                    .create_window(window_attributes)
                    .expect("Failed to create window"),
            );

            log::info!(
                "Window created: {}x{}",
                window.inner_size().width,
                window.inner_size().height
            );

            log::info!("Initializing wgpu and egui...");
            let app = pollster::block_on(App::new(window.clone(), grabber));

            log::info!("Camera Bubble ready!");
            log::info!("Press ESC to quit, B to toggle the beauty filter");

            self.state = AppState::Running { window, app };
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Only handle events if we're running
        let AppState::Running { window, app } = &mut self.state else {
            return;
        };

        // Let egui handle the event first
        let egui_consumed = app.handle_window_event(&event);

        match event {
            // Handle close request
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting...");
                event_loop.exit();
            }

            // Handle keyboard input (only if egui doesn't want it)
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !egui_consumed => {
                match key_code {
                    // Escape to exit
                    KeyCode::Escape => {
                        log::info!("Escape pressed, exiting...");
                        event_loop.exit();
                    }
                    // B to toggle the beauty filter
                    KeyCode::KeyB => {
                        app.toggle_beauty();
                    }
                    _ => {}
                }
            }

            // The window is frameless; any grab outside the controls moves it
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !egui_consumed => {
                if let Err(e) = window.drag_window() {
                    log::warn!("Window drag unsupported: {:?}", e);
                }
            }

            // Hover tracking for the reveal-on-hover controls
            WindowEvent::CursorEntered { .. } => {
                app.set_hovered(true);
            }
            WindowEvent::CursorLeft { .. } => {
                app.set_hovered(false);
            }

            // Handle window resize
            WindowEvent::Resized(physical_size) => {
                app.resize(physical_size);
            }

            // Handle redraw request (one tick)
            WindowEvent::RedrawRequested => {
                app.update_camera();

                match app.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        log::warn!("Surface lost, reconfiguring...");
                        app.resize(app.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {:?}", e);
                    }
                }

                if app.take_close_request() {
                    log::info!("Close button pressed, exiting...");
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, .. } = &mut self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        // Drive redraws at the fixed tick period
        if self.ticker.is_due(Instant::now()) {
            // Spin-wait for precise timing
            while Instant::now() < self.ticker.deadline() {
                std::hint::spin_loop();
            }

            window.request_redraw();
            self.ticker.advance(Instant::now());
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(self.ticker.wake_at()));
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Camera Bubble v0.1.0");

    // The capture device must be usable before the first tick is scheduled;
    // failing here is fatal
    let grabber = match CameraGrabber::open(CAMERA_INDEX) {
        Ok(grabber) => grabber,
        Err(e) => {
            log::error!("{}", e);
            for device in CameraGrabber::list_devices() {
                log::info!("Detected camera {}: {}", device.index, device.name);
            }
            std::process::exit(1);
        }
    };

    // Create event loop
    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    // Create and run application
    let mut app = BubbleApp::new(grabber);
    event_loop.run_app(&mut app).expect("Event loop error");
}
