// ── Editor view (host-side parent) ────────────────────────────────────────────
//
// The object an `EditorHandle` reports back to.  It records what the host has
// to act on after each engine call: the area to repaint, the scrollbar state,
// and whether the document is dirty.  The host drains these between events.

use tracing::trace;

use crate::{
    editor::{Notification, PRect, ParentCallback},
    scroll::{self, HorizontalSync, NoHorizontalSync, ScrollState},
};

pub struct EditorView {
    width: u16,
    height: u16,
    invalidated: Option<PRect>,
    vertical: ScrollState,
    horizontal: Box<dyn HorizontalSync>,
    modified: bool,
    caret_moved: bool,
}

impl std::fmt::Debug for EditorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorView")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("invalidated", &self.invalidated)
            .field("vertical", &self.vertical)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl EditorView {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            invalidated: None,
            vertical: ScrollState::default(),
            horizontal: Box::new(NoHorizontalSync),
            modified: false,
            caret_moved: false,
        }
    }

    /// Change the view size.  Follow with `EditorHandle::size_changed`.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.invalidated = Some(self.bounds());
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn bounds(&self) -> PRect {
        PRect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Replace the horizontal sync policy (for hosts that turn wrap off).
    pub fn set_horizontal_sync(&mut self, policy: Box<dyn HorizontalSync>) {
        self.horizontal = policy;
    }

    /// The pending repaint area, clearing it.
    pub fn take_invalidated(&mut self) -> Option<PRect> {
        self.invalidated.take()
    }

    pub fn vertical(&self) -> ScrollState {
        self.vertical
    }

    pub fn horizontal(&self) -> Option<ScrollState> {
        self.horizontal.state()
    }

    /// Dirty indicator, as last reported through save-point notifications.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the caret moved since the last call.
    pub fn take_caret_moved(&mut self) -> bool {
        std::mem::take(&mut self.caret_moved)
    }
}

impl ParentCallback for EditorView {
    fn editor_size(&self) -> PRect {
        self.bounds()
    }

    fn invalidate(&mut self, area: PRect) {
        let area = match self.invalidated {
            Some(pending) => pending.union(&area),
            None => area,
        };
        self.invalidated = Some(area);
    }

    fn handle_notification(&mut self, notification: Notification) {
        trace!(?notification, "engine notification");
        match notification {
            Notification::SavePointLeft => self.modified = true,
            Notification::SavePointReached => self.modified = false,
            Notification::UpdateUi => self.caret_moved = true,
            Notification::Modified { .. } => {}
        }
    }

    fn set_vertical_scroll_pos(&mut self, top_line: usize, max_top_line: usize) {
        scroll::sync_vertical(&mut self.vertical, top_line, max_top_line, usize::from(self.height));
    }

    fn set_horizontal_scroll_pos(&mut self, x_offset: usize, max_width: usize) {
        self.horizontal.sync(x_offset, max_width, usize::from(self.width));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
