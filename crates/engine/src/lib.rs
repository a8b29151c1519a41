pub mod app;
pub mod config;
pub mod window;

pub use app::{
    Color, Font, FontCache, FontStyle, FrameClock, FrameRenderer, Game, GameLoop, Key, KeyEvents,
    KeyState, LoopConfig, LoopControl, LoopHandle, LoopMetricsSnapshot, PixelSurface,
    PresentError, Surface, Texture, TextureError, Transform2, DEFAULT_FONT_FAMILY,
    DEFAULT_FONT_SIZE, DEFAULT_UPDATES_PER_SECOND, KEY_CODE_COUNT,
};
pub use config::{Config, ConfigError};
pub use window::{
    apply_mode, create_window, forward_key_event, key_from_physical, parse_dimension, Dimension,
    WindowError, WindowMode, WindowSettings, DEFAULT_TITLE,
};
