// ── Engine handle lifecycle ───────────────────────────────────────────────────
//
// `EditorHandle` owns exactly one engine instance.  It is created with a
// clipboard collaborator, optionally attached to a parent, and destroyed
// explicitly (or by drop).  Callers outside this module never see the engine
// type; they use `dispatch` or the typed helpers below.
//
// Threading: a handle is `!Send` (it holds `Rc`s) so every call happens on
// the thread that created it.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use tracing::{debug, trace};

use super::{
    engine::{Clipboard, Engine, EngineHost, OutOfMemory, ParentCallback},
    messages::{
        CaretStyle, CodePage, Command, EngineColor, EolMode, Notification, PRect, WrapMode,
        STYLE_DEFAULT,
    },
    plain::PlainEngine,
};

// ── Cell profile ──────────────────────────────────────────────────────────────

/// Engine settings applied once at creation so that its pixel arithmetic
/// lands exactly on character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineProfile {
    pub caret: CaretStyle,
    pub overtype_caret: CaretStyle,
    pub margin_left: u32,
    pub margin_right: u32,
    pub wrap: WrapMode,
    pub code_page: CodePage,
    /// Cancels the font's descent: one text line is one cell tall.
    pub extra_descent: i32,
    pub extra_line_spacing: bool,
    pub mouse_down_captures: bool,
}

/// The profile every handle gets.
pub const CELL_PROFILE: EngineProfile = EngineProfile {
    caret: CaretStyle::Block,
    overtype_caret: CaretStyle::Block,
    margin_left: 0,
    margin_right: 0,
    wrap: WrapMode::Word,
    code_page: CodePage::SingleByte,
    extra_descent: -1,
    extra_line_spacing: false,
    mouse_down_captures: true,
};

impl EngineProfile {
    fn commands(&self) -> [Command<'static>; 9] {
        [
            Command::SetCaretStyle(self.caret),
            Command::SetOvertypeCaretStyle(self.overtype_caret),
            Command::SetMarginLeft(self.margin_left),
            Command::SetMarginRight(self.margin_right),
            Command::SetWrapMode(self.wrap),
            Command::SetCodePage(self.code_page),
            Command::SetExtraDescent(self.extra_descent),
            Command::SetExtraLineSpacing(self.extra_line_spacing),
            Command::SetMouseDownCaptures(self.mouse_down_captures),
        ]
    }
}

// ── Host bridge ───────────────────────────────────────────────────────────────

/// Routes engine callbacks to the attached parent, or drops them when none is
/// attached (or the parent is already borrowed further up the stack).
struct HostBridge<'a> {
    parent: Option<Rc<RefCell<dyn ParentCallback>>>,
    clipboard: &'a dyn Clipboard,
}

impl HostBridge<'_> {
    fn with_parent(&self, f: impl FnOnce(&mut dyn ParentCallback)) {
        let Some(parent) = &self.parent else { return };
        match parent.try_borrow_mut() {
            Ok(mut p) => f(&mut *p),
            Err(_) => trace!("parent busy; engine callback dropped"),
        }
    }
}

impl EngineHost for HostBridge<'_> {
    fn editor_size(&self) -> PRect {
        self.parent
            .as_ref()
            .and_then(|p| p.try_borrow().ok().map(|p| p.editor_size()))
            .unwrap_or_default()
    }

    fn invalidate(&mut self, area: PRect) {
        self.with_parent(|p| p.invalidate(area));
    }

    fn notify(&mut self, notification: Notification) {
        self.with_parent(|p| p.handle_notification(notification));
    }

    fn set_vertical_scroll_pos(&mut self, top_line: usize, max_top_line: usize) {
        self.with_parent(|p| p.set_vertical_scroll_pos(top_line, max_top_line));
    }

    fn set_horizontal_scroll_pos(&mut self, x_offset: usize, max_width: usize) {
        self.with_parent(|p| p.set_horizontal_scroll_pos(x_offset, max_width));
    }

    fn copy_to_clipboard(&mut self, text: &[u8]) {
        self.clipboard.set_text(text);
    }

    fn clipboard_text(&mut self) -> Vec<u8> {
        self.clipboard.text()
    }
}

// ── EditorHandle ──────────────────────────────────────────────────────────────

/// An owned engine instance plus its weak link to a parent.
pub struct EditorHandle {
    engine: Box<dyn Engine>,
    parent: Option<Weak<RefCell<dyn ParentCallback>>>,
    clipboard: Rc<dyn Clipboard>,
}

impl std::fmt::Debug for EditorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorHandle")
            .field("parent_attached", &self.parent_attached())
            .finish_non_exhaustive()
    }
}

impl EditorHandle {
    /// Create a handle backed by the built-in engine.
    pub fn create(clipboard: Rc<dyn Clipboard>) -> Self {
        Self::with_engine(Box::new(PlainEngine::new()), clipboard)
    }

    /// Create a handle around any engine and apply the cell profile.
    pub fn with_engine(engine: Box<dyn Engine>, clipboard: Rc<dyn Clipboard>) -> Self {
        let mut handle = Self { engine, parent: None, clipboard };
        for cmd in CELL_PROFILE.commands() {
            handle.send(cmd);
        }
        debug!("editor handle created");
        handle
    }

    /// Release the engine.  Equivalent to dropping the handle; spelled out so
    /// ownership transfer at the call site is explicit.
    pub fn destroy(self) {
        drop(self);
    }

    /// Install, replace, or (with `None`) detach the parent.
    pub fn set_parent(&mut self, parent: Option<Weak<RefCell<dyn ParentCallback>>>) {
        self.parent = parent;
    }

    /// Attach `parent` without transferring ownership.
    pub fn attach<P: ParentCallback + 'static>(&mut self, parent: &Rc<RefCell<P>>) {
        let parent: Rc<RefCell<dyn ParentCallback>> = parent.clone();
        self.set_parent(Some(Rc::downgrade(&parent)));
    }

    pub fn parent_attached(&self) -> bool {
        self.parent.as_ref().is_some_and(|p| p.strong_count() > 0)
    }

    /// The single entry point for every engine operation.
    pub fn dispatch(&mut self, cmd: Command<'_>) -> Result<isize, OutOfMemory> {
        let mut host = HostBridge {
            parent: self.parent.as_ref().and_then(Weak::upgrade),
            clipboard: &*self.clipboard,
        };
        self.engine.dispatch(cmd, &mut host)
    }

    /// Dispatch a command that does not allocate document storage.
    pub fn send(&mut self, cmd: Command<'_>) -> isize {
        match self.dispatch(cmd) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(%e, "engine refused a non-allocating command");
                0
            }
        }
    }

    // ── Typed helpers ─────────────────────────────────────────────────────────

    pub fn len(&mut self) -> usize {
        self.send(Command::GetLength) as usize
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Copy the byte range starting at `start` into `buf`; returns bytes copied.
    pub fn text_range(&mut self, start: usize, buf: &mut [u8]) -> usize {
        self.send(Command::GetTextRange { start, buf }) as usize
    }

    /// The whole document.  Only for small documents and tests.
    pub fn text(&mut self) -> Vec<u8> {
        let mut buf = vec![0; self.len()];
        let n = self.text_range(0, &mut buf);
        buf.truncate(n);
        buf
    }

    pub fn is_modified(&mut self) -> bool {
        self.send(Command::GetModify) != 0
    }

    pub fn set_save_point(&mut self) {
        self.send(Command::SetSavePoint);
    }

    pub fn eol_mode(&mut self) -> EolMode {
        EolMode::from_reply(self.send(Command::GetEolMode))
    }

    pub fn set_eol_mode(&mut self, eol: EolMode) {
        self.send(Command::SetEolMode(eol));
    }

    pub fn is_word_wrap(&mut self) -> bool {
        self.send(Command::GetWrapMode) != 0
    }

    pub fn set_word_wrap(&mut self, enabled: bool) {
        let mode = if enabled { WrapMode::Word } else { WrapMode::None };
        self.send(Command::SetWrapMode(mode));
    }

    pub fn set_line_number_width(&mut self, width: u32) {
        self.send(Command::SetLineNumberWidth(width));
    }

    pub fn line_number_width(&mut self) -> u32 {
        self.send(Command::GetLineNumberWidth) as u32
    }

    // ── Style colours ─────────────────────────────────────────────────────────

    /// Set the foreground and background of an indexed style.
    pub fn set_style_color(&mut self, style: u8, fore: EngineColor, back: EngineColor) {
        self.send(Command::StyleSetFore(style, fore));
        self.send(Command::StyleSetBack(style, back));
    }

    /// `(fore, back)` of an indexed style.
    pub fn style_color(&mut self, style: u8) -> (EngineColor, EngineColor) {
        let fore = EngineColor::from_reply(self.send(Command::StyleGetFore(style)));
        let back = EngineColor::from_reply(self.send(Command::StyleGetBack(style)));
        (fore, back)
    }

    /// Selection highlight.  `fore = None` keeps each run's own text colour.
    pub fn set_selection_color(&mut self, fore: Option<EngineColor>, back: EngineColor) {
        self.send(Command::SetSelectionColors { fore, back });
    }

    pub fn set_whitespace_color(&mut self, fore: Option<EngineColor>, back: Option<EngineColor>) {
        self.send(Command::SetWhitespaceColors { fore, back });
    }

    /// Reset every style to `STYLE_DEFAULT` after changing it.
    pub fn set_default_style(&mut self, fore: EngineColor, back: EngineColor) {
        self.set_style_color(STYLE_DEFAULT, fore, back);
        self.send(Command::StyleClearAll);
    }

    // ── Host events ───────────────────────────────────────────────────────────

    pub fn size_changed(&mut self) {
        self.send(Command::SizeChanged);
    }

    pub fn clear_tentative_start(&mut self) {
        self.send(Command::ClearTentativeStart);
    }

    pub fn insert_paste_stream(&mut self, text: &[u8]) -> Result<(), OutOfMemory> {
        self.dispatch(Command::InsertPasteStream(text)).map(drop)
    }

    /// Returns `true` while the engine wants further idle ticks.
    pub fn idle_work(&mut self, now_ms: u32) -> bool {
        self.send(Command::IdleWork { now_ms }) != 0
    }

    /// Caret location in view cells, or `None` when scrolled out of view.
    pub fn caret_position(&mut self) -> Option<(u16, u16)> {
        let pos = self.send(Command::GetCurrentPos) as usize;
        let x = self.send(Command::PointXFromPosition(pos));
        let y = self.send(Command::PointYFromPosition(pos));
        let size = HostBridge {
            parent: self.parent.as_ref().and_then(Weak::upgrade),
            clipboard: &*self.clipboard,
        }
        .editor_size();
        let inside = x >= 0 && y >= 0 && (x as f64) < size.width() && (y as f64) < size.height();
        (inside && x <= u16::MAX as isize && y <= u16::MAX as isize).then(|| (x as u16, y as u16))
    }
}

impl Drop for EditorHandle {
    fn drop(&mut self) {
        debug!("editor handle destroyed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
