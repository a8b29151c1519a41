use std::sync::Arc;

use engine::{
    create_window, forward_key_event, Color, Config, FrameRenderer, Game, GameLoop, Key,
    KeyState, LoopConfig, LoopControl, PixelSurface, WindowSettings,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};

const CONFIG_PATH: &str = "config/config.cfg";
const MESSAGE: &str = "Hello, World!";
const MOVE_PIXELS_PER_STEP: f32 = 2.0;

/// Moves a greeting around the screen with WASD or the arrow keys; Escape
/// quits.
struct HelloGame {
    x: f32,
    y: f32,
}

impl HelloGame {
    fn new() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Game for HelloGame {
    fn initialize(&mut self) {
        info!("hello game ready");
    }

    fn terminate(&mut self) {
        info!(x = self.x, y = self.y, "hello game finished");
    }

    fn check_input(&mut self, input: &KeyState, control: &LoopControl) {
        if input.just_pressed(Key::Escape) {
            control.stop();
        }
    }

    fn update_game(&mut self, input: &KeyState) {
        if input.is_pressed(Key::W) || input.is_pressed(Key::ArrowUp) {
            self.y -= MOVE_PIXELS_PER_STEP;
        }
        if input.is_pressed(Key::S) || input.is_pressed(Key::ArrowDown) {
            self.y += MOVE_PIXELS_PER_STEP;
        }
        if input.is_pressed(Key::A) || input.is_pressed(Key::ArrowLeft) {
            self.x -= MOVE_PIXELS_PER_STEP;
        }
        if input.is_pressed(Key::D) || input.is_pressed(Key::ArrowRight) {
            self.x += MOVE_PIXELS_PER_STEP;
        }
    }

    fn render_game(&mut self, renderer: &mut FrameRenderer) {
        renderer.clear_screen();
        renderer.look_at(0.0, 0.0);
        let half_width = renderer.string_width(MESSAGE) as f32 / 2.0;
        let half_height = renderer.string_height() as f32 / 2.0;
        renderer.draw_text(
            Color::WHITE,
            MESSAGE,
            self.x - half_width,
            self.y - half_height,
        );
    }
}

fn main() {
    init_tracing();
    info!("=== Hello Game Startup ===");

    let config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            error!(path = CONFIG_PATH, error = %err, "configuration unreadable");
            std::process::exit(1);
        }
    };
    let settings = match WindowSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "invalid window configuration");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            error!(error = %err, "failed to create event loop");
            std::process::exit(1);
        }
    };
    let window = match create_window(&settings, &event_loop) {
        Ok(window) => Arc::new(window),
        Err(err) => {
            error!(error = %err, "failed to create window");
            std::process::exit(1);
        }
    };
    let surface = match PixelSurface::new(Arc::clone(&window)) {
        Ok(surface) => surface,
        Err(err) => {
            error!(error = %err, "failed to create render surface");
            std::process::exit(1);
        }
    };

    let (input, key_events) = KeyState::new();
    let renderer = FrameRenderer::with_config(Box::new(surface), &config);
    let loop_config = LoopConfig::from_config(&config);

    let handle = match GameLoop::new(&loop_config, renderer, input, HelloGame::new()).start() {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "failed to spawn game loop thread");
            std::process::exit(1);
        }
    };
    let control = handle.control();

    let run_result = event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    control.stop();
                    window_target.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    forward_key_event(&key_events, &event);
                }
                _ => {}
            },
            Event::AboutToWait => {
                if !control.is_running() {
                    window_target.exit();
                }
            }
            _ => {}
        }
    });

    handle.stop();
    if let Err(err) = handle.join() {
        error!("game loop thread panicked: {err:?}");
    }
    if let Err(err) = run_result {
        error!(error = %err, "event loop failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
