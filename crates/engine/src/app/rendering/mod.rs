mod color;
mod font;
mod glyphs;
mod renderer;
mod surface;
mod texture;
mod transform;

pub use color::Color;
pub use font::{Font, FontCache, FontStyle, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
pub use renderer::FrameRenderer;
pub use surface::{PixelSurface, PresentError, Surface};
pub use texture::{Texture, TextureError};
pub use transform::Transform2;
