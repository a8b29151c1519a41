use tracing::warn;

/// RGBA draw color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const ORANGE: Color = Color::rgb(255, 200, 0);
    pub const PINK: Color = Color::rgb(255, 175, 175);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    pub const LIGHT_GRAY: Color = Color::rgb(192, 192, 192);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Color {
        Color { r, g, b, a: 255 }
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Resolves a config string to a color: numeric decode first (hex with a
    /// `#` or `0x` prefix, octal with a leading `0`, otherwise decimal), then
    /// the fixed name table. Never errors; unknown input warns and yields
    /// black.
    pub fn resolve(text: &str) -> Color {
        let text = text.trim();
        if let Some(color) = Self::decode_numeric(text) {
            return color;
        }
        if let Some(color) = Self::from_name(text) {
            return color;
        }
        warn!(value = text, "unknown color; defaulting to black");
        Color::BLACK
    }

    /// Numeric decode of a 24-bit packed RGB value.
    fn decode_numeric(text: &str) -> Option<Color> {
        let (digits, radix) = if let Some(rest) = text.strip_prefix('#') {
            (rest, 16)
        } else if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            (rest, 16)
        } else if text.len() > 1 && text.starts_with('0') {
            (&text[1..], 8)
        } else {
            (text, 10)
        };
        let packed = u32::from_str_radix(digits, radix).ok()?;
        if packed > 0xFF_FF_FF {
            return None;
        }
        Some(Color::rgb(
            (packed >> 16) as u8,
            (packed >> 8) as u8,
            packed as u8,
        ))
    }

    /// Statically built name table; matched case-insensitively, with `_`
    /// accepted for the two-word grays.
    fn from_name(name: &str) -> Option<Color> {
        let lowered = name.to_ascii_lowercase();
        let color = match lowered.as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::RED,
            "green" => Color::GREEN,
            "blue" => Color::BLUE,
            "cyan" => Color::CYAN,
            "magenta" => Color::MAGENTA,
            "yellow" => Color::YELLOW,
            "orange" => Color::ORANGE,
            "pink" => Color::PINK,
            "gray" | "grey" => Color::GRAY,
            "darkgray" | "dark_gray" => Color::DARK_GRAY,
            "lightgray" | "light_gray" => Color::LIGHT_GRAY,
            _ => return None,
        };
        Some(color)
    }
}
