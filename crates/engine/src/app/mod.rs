mod input;
mod loop_runner;
mod metrics;
mod rendering;

pub use input::{Key, KeyEvents, KeyState, KEY_CODE_COUNT};
pub use loop_runner::{
    FrameClock, Game, GameLoop, LoopConfig, LoopControl, LoopHandle, DEFAULT_UPDATES_PER_SECOND,
};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    Color, Font, FontCache, FontStyle, FrameRenderer, PixelSurface, PresentError, Surface,
    Texture, TextureError, Transform2, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE,
};
