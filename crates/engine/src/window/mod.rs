use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::PhysicalSize;
use winit::error::OsError;
use winit::event::{ElementState, KeyEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Icon, Window, WindowBuilder};

use crate::app::{Key, KeyEvents};
use crate::config::Config;

pub const DEFAULT_TITLE: &str = "My Game";

/// Fallback dimensions when the primary monitor cannot be queried.
const FALLBACK_WIDTH: u32 = 1280;
const FALLBACK_HEIGHT: u32 = 720;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window dimension {key}={value:?} is not a number or \"system\"")]
    BadDimension { key: &'static str, value: String },
    #[error("window dimension {key}={value:?} must be positive")]
    NegativeDimension { key: &'static str, value: String },
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Windowed,
    Borderless,
    Fullscreen,
}

impl WindowMode {
    /// Parses the `mode` config value. Unknown values warn and fall back to
    /// windowed.
    pub fn from_config(config: &Config) -> WindowMode {
        match config.get_opt("mode") {
            None => WindowMode::Windowed,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "windowed" => WindowMode::Windowed,
                "borderless" => WindowMode::Borderless,
                "fullscreen" => WindowMode::Fullscreen,
                _ => {
                    warn!(mode = %value, "unknown window mode, using windowed");
                    WindowMode::Windowed
                }
            },
        }
    }
}

/// One axis of the requested window size: an explicit pixel count, or the
/// `"system"` sentinel meaning the primary display's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    System,
    Pixels(u32),
}

/// Parses a `width`/`height` config value. Unlike most config keys this is
/// fatal on bad input: a window with a nonsense size is not recoverable by
/// defaulting.
pub fn parse_dimension(key: &'static str, value: &str) -> Result<Dimension, WindowError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("system") {
        return Ok(Dimension::System);
    }
    let parsed: i64 = trimmed.parse().map_err(|_| WindowError::BadDimension {
        key,
        value: value.to_string(),
    })?;
    if parsed <= 0 {
        return Err(WindowError::NegativeDimension {
            key,
            value: value.to_string(),
        });
    }
    Ok(Dimension::Pixels(parsed.min(u32::MAX as i64) as u32))
}

#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub title: String,
    pub width: Dimension,
    pub height: Dimension,
    pub mode: WindowMode,
    pub icon_path: Option<String>,
}

impl WindowSettings {
    pub fn from_config(config: &Config) -> Result<WindowSettings, WindowError> {
        let width = match config.get_opt("width") {
            Some(value) => parse_dimension("width", value)?,
            None => Dimension::System,
        };
        let height = match config.get_opt("height") {
            Some(value) => parse_dimension("height", value)?,
            None => Dimension::System,
        };
        Ok(WindowSettings {
            title: config.get_or("title", DEFAULT_TITLE).to_string(),
            width,
            height,
            mode: WindowMode::from_config(config),
            icon_path: config.get_opt("windowIcon").map(str::to_string),
        })
    }
}

pub fn create_window(
    settings: &WindowSettings,
    event_loop: &EventLoop<()>,
) -> Result<Window, WindowError> {
    let monitor_size = event_loop
        .primary_monitor()
        .map(|monitor| monitor.size());
    let width = resolve_axis(settings.width, monitor_size.map(|size| size.width), FALLBACK_WIDTH);
    let height = resolve_axis(
        settings.height,
        monitor_size.map(|size| size.height),
        FALLBACK_HEIGHT,
    );

    let mut builder = WindowBuilder::new()
        .with_title(settings.title.clone())
        .with_inner_size(PhysicalSize::new(width, height));

    match settings.mode {
        WindowMode::Windowed => {}
        WindowMode::Borderless => {
            builder = builder.with_decorations(false);
        }
        WindowMode::Fullscreen => {
            // Exclusive mode selection is not portable; borderless fullscreen
            // over the current monitor is the supported rendition.
            builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }

    if let Some(path) = &settings.icon_path {
        match load_icon(path) {
            Some(icon) => builder = builder.with_window_icon(Some(icon)),
            None => warn!(path = %path, "window icon unavailable, continuing without"),
        }
    }

    let window = builder.build(event_loop).map_err(WindowError::CreateWindow)?;
    info!(
        title = %settings.title,
        width,
        height,
        mode = ?settings.mode,
        "window created"
    );
    Ok(window)
}

/// Switches the live window between modes. Requesting the mode that is
/// already active warns and leaves the window alone.
pub fn apply_mode(window: &Window, current: WindowMode, requested: WindowMode) -> WindowMode {
    if requested == current {
        warn!(mode = ?requested, "window already in requested mode");
        return current;
    }
    match requested {
        WindowMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
        }
        WindowMode::Borderless => {
            window.set_fullscreen(None);
            window.set_decorations(false);
        }
        WindowMode::Fullscreen => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
    requested
}

fn resolve_axis(requested: Dimension, system: Option<u32>, fallback: u32) -> u32 {
    match requested {
        Dimension::Pixels(pixels) => pixels,
        Dimension::System => match system {
            Some(pixels) if pixels > 0 => pixels,
            _ => {
                warn!(fallback, "no primary monitor size available");
                fallback
            }
        },
    }
}

fn load_icon(path: &str) -> Option<Icon> {
    let decoded = match image::open(path) {
        Ok(decoded) => decoded.to_rgba8(),
        Err(error) => {
            warn!(path = %path, error = %error, "failed to decode window icon");
            return None;
        }
    };
    let (width, height) = decoded.dimensions();
    match Icon::from_rgba(decoded.into_raw(), width, height) {
        Ok(icon) => Some(icon),
        Err(error) => {
            warn!(path = %path, error = %error, "window icon rejected");
            None
        }
    }
}

/// Forwards a winit keyboard event into the shared key bitmask. Unmapped keys
/// are ignored.
pub fn forward_key_event(events: &KeyEvents, key_event: &KeyEvent) {
    let Some(key) = key_from_physical(key_event.physical_key) else {
        return;
    };
    match key_event.state {
        ElementState::Pressed => events.key_down(key),
        ElementState::Released => events.key_up(key),
    }
}

pub fn key_from_physical(physical: PhysicalKey) -> Option<Key> {
    let PhysicalKey::Code(code) = physical else {
        return None;
    };
    let key = match code {
        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,
        KeyCode::Enter => Key::Enter,
        KeyCode::Space => Key::Space,
        KeyCode::Escape => Key::Escape,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        _ => return None,
    };
    Some(key)
}
