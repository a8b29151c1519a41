use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::glyphs::{GLYPH_HEIGHT, GLYPH_WIDTH};

pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: i32 = 30;

/// Style bits: bold is bit 0, italic is bit 1. The valid packed range is
/// 0..=3, same as the bitwise-OR of the two flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontStyle(u8);

impl FontStyle {
    pub const PLAIN: FontStyle = FontStyle(0);
    pub const BOLD: FontStyle = FontStyle(1);
    pub const ITALIC: FontStyle = FontStyle(2);
    pub const BOLD_ITALIC: FontStyle = FontStyle(3);

    pub fn from_bits(bits: i32) -> Option<FontStyle> {
        if (0..=3).contains(&bits) {
            Some(FontStyle(bits as u8))
        } else {
            None
        }
    }

    pub fn is_bold(self) -> bool {
        self.0 & 1 != 0
    }

    pub fn is_italic(self) -> bool {
        self.0 & 2 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

/// A realized font: the built-in glyph grid scaled to the requested size.
/// The family name is carried as cache-key data; resolving it against
/// installed system fonts is a collaborator concern, not handled here.
#[derive(Debug, PartialEq, Eq)]
pub struct Font {
    family: String,
    style: FontStyle,
    size: i32,
    scale: i32,
}

impl Font {
    fn new(family: &str, style: FontStyle, size: i32) -> Font {
        Font {
            family: family.to_string(),
            style,
            size,
            scale: (size / (GLYPH_HEIGHT + 1)).max(1),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Pixel multiplier applied to the base glyph grid.
    pub(crate) fn pixel_scale(&self) -> i32 {
        self.scale
    }

    /// Horizontal advance per character, including inter-glyph spacing and
    /// the extra column bold rendering adds.
    pub fn glyph_advance(&self) -> i32 {
        let base = (GLYPH_WIDTH + 1) * self.scale;
        if self.style.is_bold() {
            base + 1
        } else {
            base
        }
    }

    pub fn line_height(&self) -> i32 {
        (GLYPH_HEIGHT + 2) * self.scale
    }

    pub fn string_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.glyph_advance()
    }

    pub fn string_height(&self) -> i32 {
        GLYPH_HEIGHT * self.scale
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    style: u8,
    size: i32,
}

/// Memoizes realized fonts by (family, style, size). Grows monotonically and
/// never evicts; it lives as long as the renderer.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: HashMap<FontKey, Arc<Font>>,
}

impl FontCache {
    pub fn new() -> FontCache {
        FontCache::default()
    }

    /// Validated lookup. An out-of-range style or non-positive size warns and
    /// substitutes the fixed default font rather than failing.
    pub fn get_new_font(&mut self, family: &str, style_bits: i32, size: i32) -> Arc<Font> {
        let Some(style) = FontStyle::from_bits(style_bits) else {
            warn!(
                style = style_bits,
                "invalid font style; valid styles are 0 plain, 1 bold, 2 italic, 3 both; using default font"
            );
            return self.default_font();
        };
        if size <= 0 {
            warn!(size, "font size must be a positive integer; using default font");
            return self.default_font();
        }
        self.realize(family, style, size)
    }

    pub fn default_font(&mut self) -> Arc<Font> {
        self.realize(DEFAULT_FONT_FAMILY, FontStyle::PLAIN, DEFAULT_FONT_SIZE)
    }

    fn realize(&mut self, family: &str, style: FontStyle, size: i32) -> Arc<Font> {
        let key = FontKey {
            family: family.to_string(),
            style: style.bits(),
            size,
        };
        Arc::clone(
            self.fonts
                .entry(key)
                .or_insert_with(|| Arc::new(Font::new(family, style, size))),
        )
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.fonts.len()
    }
}
