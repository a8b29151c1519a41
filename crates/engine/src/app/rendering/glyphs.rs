//! Built-in 3x5 pixel glyphs for the text drawing path. Lowercase letters
//! share the uppercase shapes; characters without a shape render as a hollow
//! box so missing coverage is visible instead of silent.

pub(crate) const GLYPH_WIDTH: i32 = 3;
pub(crate) const GLYPH_HEIGHT: i32 = 5;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Glyph {
    pub rows: [u8; GLYPH_HEIGHT as usize],
}

pub(crate) const SPACE_GLYPH: Glyph = Glyph {
    rows: [0, 0, 0, 0, 0],
};

const UNKNOWN_GLYPH: Glyph = Glyph {
    rows: [0b111, 0b101, 0b101, 0b101, 0b111],
};

pub(crate) fn glyph_for(ch: char) -> Glyph {
    let ch = ch.to_ascii_uppercase();
    match ch {
        ' ' => SPACE_GLYPH,
        '!' => Glyph {
            rows: [0b010, 0b010, 0b010, 0b000, 0b010],
        },
        '"' => Glyph {
            rows: [0b101, 0b101, 0b000, 0b000, 0b000],
        },
        '\'' => Glyph {
            rows: [0b010, 0b010, 0b000, 0b000, 0b000],
        },
        '(' => Glyph {
            rows: [0b001, 0b010, 0b010, 0b010, 0b001],
        },
        ')' => Glyph {
            rows: [0b100, 0b010, 0b010, 0b010, 0b100],
        },
        '*' => Glyph {
            rows: [0b000, 0b101, 0b010, 0b101, 0b000],
        },
        '+' => Glyph {
            rows: [0b000, 0b010, 0b111, 0b010, 0b000],
        },
        ',' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b010, 0b100],
        },
        '-' => Glyph {
            rows: [0b000, 0b000, 0b111, 0b000, 0b000],
        },
        '.' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b000, 0b010],
        },
        '/' => Glyph {
            rows: [0b001, 0b001, 0b010, 0b100, 0b100],
        },
        ':' => Glyph {
            rows: [0b000, 0b010, 0b000, 0b010, 0b000],
        },
        ';' => Glyph {
            rows: [0b000, 0b010, 0b000, 0b010, 0b100],
        },
        '<' => Glyph {
            rows: [0b001, 0b010, 0b100, 0b010, 0b001],
        },
        '=' => Glyph {
            rows: [0b000, 0b111, 0b000, 0b111, 0b000],
        },
        '>' => Glyph {
            rows: [0b100, 0b010, 0b001, 0b010, 0b100],
        },
        '?' => Glyph {
            rows: [0b110, 0b001, 0b010, 0b000, 0b010],
        },
        '0' => Glyph {
            rows: [0b111, 0b101, 0b101, 0b101, 0b111],
        },
        '1' => Glyph {
            rows: [0b010, 0b110, 0b010, 0b010, 0b111],
        },
        '2' => Glyph {
            rows: [0b111, 0b001, 0b111, 0b100, 0b111],
        },
        '3' => Glyph {
            rows: [0b111, 0b001, 0b011, 0b001, 0b111],
        },
        '4' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b001, 0b001],
        },
        '5' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b001, 0b111],
        },
        '6' => Glyph {
            rows: [0b111, 0b100, 0b111, 0b101, 0b111],
        },
        '7' => Glyph {
            rows: [0b111, 0b001, 0b010, 0b010, 0b010],
        },
        '8' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b101, 0b111],
        },
        '9' => Glyph {
            rows: [0b111, 0b101, 0b111, 0b001, 0b111],
        },
        'A' => Glyph {
            rows: [0b010, 0b101, 0b111, 0b101, 0b101],
        },
        'B' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b110],
        },
        'C' => Glyph {
            rows: [0b011, 0b100, 0b100, 0b100, 0b011],
        },
        'D' => Glyph {
            rows: [0b110, 0b101, 0b101, 0b101, 0b110],
        },
        'E' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b111],
        },
        'F' => Glyph {
            rows: [0b111, 0b100, 0b110, 0b100, 0b100],
        },
        'G' => Glyph {
            rows: [0b011, 0b100, 0b101, 0b101, 0b011],
        },
        'H' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b101, 0b101],
        },
        'I' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b111],
        },
        'J' => Glyph {
            rows: [0b001, 0b001, 0b001, 0b101, 0b010],
        },
        'K' => Glyph {
            rows: [0b101, 0b101, 0b110, 0b101, 0b101],
        },
        'L' => Glyph {
            rows: [0b100, 0b100, 0b100, 0b100, 0b111],
        },
        'M' => Glyph {
            rows: [0b101, 0b111, 0b111, 0b101, 0b101],
        },
        'N' => Glyph {
            rows: [0b101, 0b111, 0b111, 0b111, 0b101],
        },
        'O' => Glyph {
            rows: [0b010, 0b101, 0b101, 0b101, 0b010],
        },
        'P' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b100, 0b100],
        },
        'Q' => Glyph {
            rows: [0b010, 0b101, 0b101, 0b110, 0b011],
        },
        'R' => Glyph {
            rows: [0b110, 0b101, 0b110, 0b101, 0b101],
        },
        'S' => Glyph {
            rows: [0b011, 0b100, 0b010, 0b001, 0b110],
        },
        'T' => Glyph {
            rows: [0b111, 0b010, 0b010, 0b010, 0b010],
        },
        'U' => Glyph {
            rows: [0b101, 0b101, 0b101, 0b101, 0b111],
        },
        'V' => Glyph {
            rows: [0b101, 0b101, 0b101, 0b101, 0b010],
        },
        'W' => Glyph {
            rows: [0b101, 0b101, 0b111, 0b111, 0b101],
        },
        'X' => Glyph {
            rows: [0b101, 0b101, 0b010, 0b101, 0b101],
        },
        'Y' => Glyph {
            rows: [0b101, 0b101, 0b010, 0b010, 0b010],
        },
        'Z' => Glyph {
            rows: [0b111, 0b001, 0b010, 0b100, 0b111],
        },
        '[' => Glyph {
            rows: [0b011, 0b010, 0b010, 0b010, 0b011],
        },
        ']' => Glyph {
            rows: [0b110, 0b010, 0b010, 0b010, 0b110],
        },
        '_' => Glyph {
            rows: [0b000, 0b000, 0b000, 0b000, 0b111],
        },
        '|' => Glyph {
            rows: [0b010, 0b010, 0b010, 0b010, 0b010],
        },
        _ => UNKNOWN_GLYPH,
    }
}
