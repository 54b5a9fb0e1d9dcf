// ── Colour conversion ─────────────────────────────────────────────────────────
//
// Host colours are crossterm `Color`s; the engine stores packed `0x00BBGGRR`
// integers.  Engine → host is exact (always `Color::Rgb`).  Host → engine
// resolves named and indexed colours through the xterm palette, and `Reset`
// through a caller-supplied fallback, so the round trip is lossy only for
// those.

use crossterm::style::Color;

use crate::editor::EngineColor;

/// A foreground/background pair in the host's colour space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAttr {
    pub fg: Color,
    pub bg: Color,
}

impl Default for ColorAttr {
    fn default() -> Self {
        Self { fg: Color::Reset, bg: Color::Reset }
    }
}

impl ColorAttr {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    /// `(fore, back)` in engine colours.  `Reset` maps to black text on white.
    pub fn to_engine(self) -> (EngineColor, EngineColor) {
        (to_engine(self.fg, EngineColor::BLACK), to_engine(self.bg, EngineColor::WHITE))
    }

    pub fn from_engine(fore: EngineColor, back: EngineColor) -> Self {
        Self { fg: from_engine(fore), bg: from_engine(back) }
    }
}

/// The standard xterm values of the 16 ANSI colours.
const ANSI16: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// RGB of an xterm 256-colour index.
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    match index {
        0..=15 => ANSI16[usize::from(index)],
        232..=255 => {
            let gray = 8 + 10 * (index - 232);
            (gray, gray, gray)
        }
        _ => {
            let i = index - 16;
            (LEVELS[usize::from(i / 36)], LEVELS[usize::from((i / 6) % 6)], LEVELS[usize::from(i % 6)])
        }
    }
}

fn ansi_index(color: Color) -> Option<u8> {
    let index = match color {
        Color::Black => 0,
        Color::DarkRed => 1,
        Color::DarkGreen => 2,
        Color::DarkYellow => 3,
        Color::DarkBlue => 4,
        Color::DarkMagenta => 5,
        Color::DarkCyan => 6,
        Color::Grey => 7,
        Color::DarkGrey => 8,
        Color::Red => 9,
        Color::Green => 10,
        Color::Yellow => 11,
        Color::Blue => 12,
        Color::Magenta => 13,
        Color::Cyan => 14,
        Color::White => 15,
        Color::AnsiValue(i) => i,
        Color::Reset | Color::Rgb { .. } => return None,
    };
    Some(index)
}

/// Host colour → engine colour; `Reset` becomes `reset`.
pub fn to_engine(color: Color, reset: EngineColor) -> EngineColor {
    match color {
        Color::Reset => reset,
        Color::Rgb { r, g, b } => EngineColor::rgb(r, g, b),
        other => {
            let (r, g, b) = ansi_index(other).map_or((0, 0, 0), ansi256_to_rgb);
            EngineColor::rgb(r, g, b)
        }
    }
}

/// Engine colour → host colour.
pub fn from_engine(color: EngineColor) -> Color {
    Color::Rgb { r: color.r(), g: color.g(), b: color.b() }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
