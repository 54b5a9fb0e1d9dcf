// ── Dual light/dark colour theme ───────────────────────────────────────────────
//
// Applies a light or dark palette to an editor.  `apply_theme(handle, dark)`
// with `dark = true` uses VS Code Dark+-inspired colours, `dark = false` the
// Notepad++-style light ones.
//
// Colour conventions:
//   • Palette entries are written 0xRRGGBB through the `rgb!` macro, which
//     yields a crossterm `Color::Rgb`.
//   • Colours reach the engine through the render bridge, so the palette never
//     deals in engine colour integers.

use crossterm::style::Color;
use tracing::debug;

use crate::{
    editor::{Command, EditorHandle, STYLE_LINENUMBER},
    render::{self, to_engine, ColorAttr},
};

// ── Colour macro ──────────────────────────────────────────────────────────────

macro_rules! rgb {
    ($r:expr, $g:expr, $b:expr) => {
        Color::Rgb { r: $r, g: $g, b: $b }
    };
}

// ── Colour palette ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Default text style; every indexed style starts from it.
    pub text: ColorAttr,
    pub line_numbers: ColorAttr,
    /// Selection highlight.  A `Reset` foreground keeps the text colour.
    pub selection: ColorAttr,
    /// Whitespace glyphs.  `Reset` channels fall back to the text style.
    pub whitespace: ColorAttr,
    pub caret: Color,
}

/// Notepad++-style light palette.
pub const LIGHT: Palette = Palette {
    text: ColorAttr::new(rgb!(0x00, 0x00, 0x00), rgb!(0xFF, 0xFF, 0xFF)),
    line_numbers: ColorAttr::new(rgb!(0x80, 0x80, 0x80), rgb!(0xE4, 0xE4, 0xE4)),
    selection: ColorAttr::new(Color::Reset, rgb!(0xC0, 0xC0, 0xC0)),
    whitespace: ColorAttr::new(rgb!(0xB0, 0xB0, 0xB0), Color::Reset),
    caret: rgb!(0x00, 0x00, 0x00),
};

/// VS Code Dark+-inspired dark palette.
pub const DARK: Palette = Palette {
    text: ColorAttr::new(rgb!(0xD4, 0xD4, 0xD4), rgb!(0x1E, 0x1E, 0x1E)),
    line_numbers: ColorAttr::new(rgb!(0x85, 0x85, 0x85), rgb!(0x25, 0x25, 0x26)),
    selection: ColorAttr::new(Color::Reset, rgb!(0x26, 0x4F, 0x78)),
    whitespace: ColorAttr::new(rgb!(0x40, 0x40, 0x40), Color::Reset),
    caret: rgb!(0xAE, 0xAF, 0xAD),
};

pub fn palette(dark: bool) -> &'static Palette {
    if dark {
        &DARK
    } else {
        &LIGHT
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Apply a light or dark theme to `handle`.
///
/// Sequence:
/// 1. Set `STYLE_DEFAULT` colours and clone them into all 256 slots.
/// 2. Override `STYLE_LINENUMBER`.
/// 3. Set the selection, whitespace and caret colours.
pub fn apply_theme(handle: &mut EditorHandle, dark: bool) {
    let p = palette(dark);
    debug!(dark, "applying theme");

    let (fore, back) = p.text.to_engine();
    handle.set_default_style(fore, back);
    render::set_style_color(handle, STYLE_LINENUMBER, p.line_numbers);
    render::set_selection_color(handle, p.selection);
    render::set_whitespace_color(handle, p.whitespace);
    handle.send(Command::SetCaretFore(to_engine(p.caret, fore)));
}

// ── Tests ─────────────────────────────────────────────────────────────────────
