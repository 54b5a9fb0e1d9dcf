// ── Engine boundary ───────────────────────────────────────────────────────────
//
// The editing engine is opaque: the adapter only ever talks to it through
// `Engine::dispatch`.  During a dispatch the engine may call back into the
// host through `EngineHost`, synchronously and on the same thread.  Painting
// goes through `Surface`, which the render bridge implements over the cell
// grid.

use std::cell::RefCell;

use super::messages::{Command, EngineColor, Notification, PRect};

// ── Errors ────────────────────────────────────────────────────────────────────

/// The only failure an engine reports across the boundary: it could not
/// reserve memory for document storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine storage exhausted ({requested} bytes requested)")]
pub struct OutOfMemory {
    pub requested: usize,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// An editing engine instance: document, styling, selection, view state.
pub trait Engine {
    /// Process one command.  Integer replies follow the `Command` docs.
    fn dispatch(&mut self, cmd: Command<'_>, host: &mut dyn EngineHost)
        -> Result<isize, OutOfMemory>;
}

/// Callbacks an engine may issue while processing a command.
pub trait EngineHost {
    /// The view rectangle in engine units.
    fn editor_size(&self) -> PRect;
    fn invalidate(&mut self, area: PRect);
    fn notify(&mut self, notification: Notification);
    fn set_vertical_scroll_pos(&mut self, top_line: usize, max_top_line: usize);
    fn set_horizontal_scroll_pos(&mut self, x_offset: usize, max_width: usize);
    fn copy_to_clipboard(&mut self, text: &[u8]);
    fn clipboard_text(&mut self) -> Vec<u8>;

    /// Request a deferred callback after `ms` milliseconds.
    ///
    /// Returns `false`: this host has no engine-driven timers.  Periodic work
    /// runs only when the host calls `Command::IdleWork` from its own loop.
    fn set_timer(&mut self, _ms: u32) -> bool {
        false
    }
}

// ── Parent ────────────────────────────────────────────────────────────────────

/// The host-side parent of an editor view.
///
/// Every method has a no-op default, so a parent only overrides what it
/// displays.  A handle with no parent attached behaves as if this default
/// parent were installed.
pub trait ParentCallback {
    fn editor_size(&self) -> PRect {
        PRect::default()
    }

    fn invalidate(&mut self, _area: PRect) {}

    fn handle_notification(&mut self, _notification: Notification) {}

    fn set_vertical_scroll_pos(&mut self, _top_line: usize, _max_top_line: usize) {}

    fn set_horizontal_scroll_pos(&mut self, _x_offset: usize, _max_width: usize) {}
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// Colours and attributes of one glyph run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStyle {
    pub fore: EngineColor,
    pub back: EngineColor,
    pub bold: bool,
}

/// The drawing contract consumed by the engine's paint routine.
pub trait Surface {
    /// Font ascent in engine units.
    fn ascent(&self) -> f64;
    /// Font descent in engine units.
    fn descent(&self) -> f64;
    fn fill_rect(&mut self, rc: PRect, back: EngineColor);
    /// Draw `text` inside `rc`, baseline at `ybase`.
    fn draw_text(&mut self, rc: PRect, ybase: f64, text: &str, style: RunStyle);
}

// ── Clipboard ─────────────────────────────────────────────────────────────────

/// Clipboard transfer contract.  Storage lives with the host.
pub trait Clipboard {
    fn set_text(&self, text: &[u8]);
    fn text(&self) -> Vec<u8>;
}

/// Process-local clipboard, for hosts without a system clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: RefCell<Vec<u8>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &[u8]) {
        let mut contents = self.contents.borrow_mut();
        contents.clear();
        contents.extend_from_slice(text);
    }

    fn text(&self) -> Vec<u8> {
        self.contents.borrow().clone()
    }
}
