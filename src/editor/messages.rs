// ── Engine command vocabulary ─────────────────────────────────────────────────
//
// Everything the host can ask of an editing engine is one `Command` sent
// through `Engine::dispatch`.  Integer replies follow the engine family's
// conventions: booleans are 0/1, positions are byte offsets, colours are
// packed `0x00BBGGRR` values.

use bitflags::bitflags;

use super::engine::Surface;

// ── Colour ────────────────────────────────────────────────────────────────────

/// The engine's packed colour: `0x00BBGGRR` (blue in the high byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EngineColor(pub u32);

impl EngineColor {
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((b as u32) << 16) | ((g as u32) << 8) | (r as u32))
    }

    pub const fn r(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn g(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub const fn b(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Decode a reply from a `Style*Get*` command.
    pub fn from_reply(value: isize) -> Self {
        Self((value as u32) & 0x00FF_FFFF)
    }
}

// ── Styles ────────────────────────────────────────────────────────────────────

/// Style used for all text when no lexer assigns one.
pub const STYLE_TEXT: u8 = 0;
/// Global default style; cloned into every slot by `StyleClearAll`.
pub const STYLE_DEFAULT: u8 = 32;
/// Style of the line-number margin.
pub const STYLE_LINENUMBER: u8 = 33;
/// Number of indexed style slots.
pub const STYLE_COUNT: usize = 256;

// ── EOL mode ──────────────────────────────────────────────────────────────────

/// The end-of-line convention used for newly typed line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EolMode {
    /// Windows-style `\r\n`.
    Crlf,
    /// Unix-style `\n`.
    Lf,
    /// Old Mac-style `\r`.
    Cr,
}

impl EolMode {
    /// Short display string shown in the status line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crlf => "CRLF",
            Self::Lf => "LF",
            Self::Cr => "CR",
        }
    }

    /// The bytes inserted for a line break in this mode.
    pub fn bytes(self) -> &'static [u8] {
        match self {
            Self::Crlf => b"\r\n",
            Self::Lf => b"\n",
            Self::Cr => b"\r",
        }
    }

    /// The host platform's native convention.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Crlf
        } else {
            Self::Lf
        }
    }

    pub(crate) fn to_reply(self) -> isize {
        match self {
            Self::Crlf => 0,
            Self::Lf => 1,
            Self::Cr => 2,
        }
    }

    pub(crate) fn from_reply(value: isize) -> Self {
        match value {
            1 => Self::Lf,
            2 => Self::Cr,
            _ => Self::Crlf,
        }
    }
}

// ── Display settings ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    None,
    Word,
}

/// How document bytes map to glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePage {
    /// Every byte is one glyph (Latin-1 interpretation).
    SingleByte,
    Utf8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretStyle {
    Line,
    Block,
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Engine key codes.  Named keys are the engine's navigation/editing set;
/// everything else arrives as a character code (`'A'`..`'Z'` when Ctrl is held).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Down,
    Up,
    Left,
    Right,
    Home,
    End,
    Prior,
    Next,
    Delete,
    Insert,
    Escape,
    Back,
    Tab,
    Return,
    Char(u32),
}

bitflags! {
    /// Engine modifier bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL  = 2;
        const ALT   = 4;
    }
}

// ── Mouse ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    ButtonDown,
    Move,
    ButtonUp,
}

/// A mouse event in view-relative cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    pub action: MouseAction,
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
    /// Monotonic milliseconds; used for double-click detection.
    pub time_ms: u32,
}

// ── Text input ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSource {
    /// Committed input.
    Direct,
    /// Provisional input that a later `ClearTentativeStart` removes again.
    Tentative,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// An engine-space rectangle.  Under the cell profile one unit is one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PRect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &PRect) -> PRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        PRect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn intersects_rows(&self, top: f64, bottom: f64) -> bool {
        top < self.bottom && bottom > self.top
    }
}

// ── Notifications (engine → parent) ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Document first edited after a save point.
    SavePointLeft,
    /// Document returned to the save point.
    SavePointReached,
    /// Text was inserted (`length_added > 0`) or removed at `position`.
    Modified { position: usize, length_added: isize },
    /// Caret moved or selection changed.
    UpdateUi,
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// A single request to the engine.  See each variant for its reply.
pub enum Command<'a> {
    // ── Document content ──────────────────────────────────────────────────────
    /// Reserve storage for at least this many bytes.  Fails with `OutOfMemory`.
    Allocate(usize),
    /// Append bytes at the end without moving the caret.  Fails with `OutOfMemory`.
    AppendText(&'a [u8]),
    /// Remove all text.
    ClearAll,
    /// Reply: byte length of the document.
    GetLength,
    /// Copy bytes starting at `start` into `buf`.  Reply: bytes copied.
    GetTextRange { start: usize, buf: &'a mut [u8] },
    /// Reply: the byte at a position, or 0 past the end.
    GetCharAt(usize),
    /// Delete `length` bytes at `start`.
    DeleteRange { start: usize, length: usize },
    /// Delete several `(start, length)` runs, ascending and non-overlapping,
    /// with positions taken before any of them is removed.  Reply: bytes removed.
    DeleteRanges(&'a [(usize, usize)]),
    /// Reply: number of lines (always ≥ 1).
    GetLineCount,
    /// Reply: 0-based line containing a position.
    LineFromPosition(usize),
    /// Reply: first position of a line (clamped to the document end).
    PositionFromLine(usize),
    /// Reply: position just before the line's end-of-line bytes.
    GetLineEndPosition(usize),
    /// Reply: tab-expanded column of a position.
    GetColumn(usize),

    // ── Modification state ────────────────────────────────────────────────────
    SetSavePoint,
    /// Reply: 1 when modified since the save point.
    GetModify,

    // ── Document settings ─────────────────────────────────────────────────────
    SetEolMode(EolMode),
    GetEolMode,
    SetWrapMode(WrapMode),
    /// Reply: 0 = none, 1 = word.
    GetWrapMode,
    SetUseTabs(bool),
    GetUseTabs,
    SetIndent(usize),
    GetIndent,
    SetTabWidth(usize),
    GetTabWidth,
    SetCodePage(CodePage),

    // ── View settings ─────────────────────────────────────────────────────────
    SetCaretStyle(CaretStyle),
    SetOvertypeCaretStyle(CaretStyle),
    /// Reply: 1 when the insert-mode caret is a block.
    GetCaretStyle,
    SetOvertype(bool),
    GetOvertype,
    SetMarginLeft(u32),
    SetMarginRight(u32),
    /// Width in cells of the line-number margin (0 hides it).
    SetLineNumberWidth(u32),
    GetLineNumberWidth,
    SetExtraDescent(i32),
    SetExtraLineSpacing(bool),
    SetMouseDownCaptures(bool),
    /// Reply: height of one text line in engine units.
    TextHeight,

    // ── Styles ────────────────────────────────────────────────────────────────
    StyleSetFore(u8, EngineColor),
    StyleSetBack(u8, EngineColor),
    StyleGetFore(u8),
    StyleGetBack(u8),
    StyleSetBold(u8, bool),
    /// Copy `STYLE_DEFAULT` into every slot.
    StyleClearAll,
    SetSelectionColors { fore: Option<EngineColor>, back: EngineColor },
    SetWhitespaceColors { fore: Option<EngineColor>, back: Option<EngineColor> },
    SetCaretFore(EngineColor),

    // ── Host events ───────────────────────────────────────────────────────────
    /// The parent's size changed; the engine re-queries it.
    SizeChanged,
    /// Remove any provisional text inserted with `CharacterSource::Tentative`.
    ClearTentativeStart,
    /// Insert a pasted block at the caret, converting line ends.
    InsertPasteStream(&'a [u8]),
    InsertCharacter { ch: char, source: CharacterSource },
    /// Idle-time work (caret blink).  Reply: 1 when more idle ticks are wanted.
    IdleWork { now_ms: u32 },
    /// Reply: 1 when the key was consumed.
    KeyDown { key: Key, modifiers: Modifiers },
    /// Reply: 1 when the event was handled.
    Mouse(MouseInput),
    /// Paint the part of the view inside `area` onto `surface`.
    Paint { surface: &'a mut dyn Surface, area: PRect },

    // ── Caret / selection ─────────────────────────────────────────────────────
    GetCurrentPos,
    GetAnchor,
    GotoPos(usize),
    SetSel { anchor: usize, caret: usize },
    SelectAll,
    /// Reply: view x of a position, in engine units.
    PointXFromPosition(usize),
    /// Reply: view y of a position, in engine units.
    PointYFromPosition(usize),

    // ── Scrolling ─────────────────────────────────────────────────────────────
    GetFirstVisibleLine,
    SetFirstVisibleLine(usize),
    /// Reply: number of whole lines that fit in the view.
    LinesOnScreen,
    LineScroll(isize),

    // ── Clipboard ─────────────────────────────────────────────────────────────
    Copy,
    Cut,
    Paste,
}

impl std::fmt::Debug for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AppendText(text) => write!(f, "AppendText({} bytes)", text.len()),
            Self::InsertPasteStream(text) => write!(f, "InsertPasteStream({} bytes)", text.len()),
            Self::GetTextRange { start, buf } => {
                write!(f, "GetTextRange {{ start: {start}, len: {} }}", buf.len())
            }
            Self::Paint { area, .. } => write!(f, "Paint {{ area: {area:?} }}"),
            Self::KeyDown { key, modifiers } => write!(f, "KeyDown({key:?}, {modifiers:?})"),
            Self::Mouse(input) => write!(f, "Mouse({input:?})"),
            Self::Allocate(n) => write!(f, "Allocate({n})"),
            Self::DeleteRanges(runs) => write!(f, "DeleteRanges({} runs)", runs.len()),
            _ => f.write_str("Command"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
