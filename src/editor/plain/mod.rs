// ── Built-in engine ───────────────────────────────────────────────────────────
//
// A small engine that honours the full `Command` protocol with flat byte
// storage.  It exists so the adapter works (and is testable) without a native
// engine: no undo history, no lexing, a single selection.

mod layout;
mod paint;

use std::ops::Range;

use tracing::trace;

use super::{
    engine::{Engine, EngineHost, OutOfMemory},
    messages::{
        CaretStyle, CharacterSource, CodePage, Command, EngineColor, EolMode, Key, Modifiers,
        MouseAction, MouseInput, Notification, PRect, WrapMode, STYLE_COUNT, STYLE_DEFAULT,
        STYLE_LINENUMBER,
    },
};
use layout::Layout;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Cell font metrics; with the profile's extra descent of -1 a line is one cell.
const FONT_ASCENT: i32 = 1;
const FONT_DESCENT: i32 = 1;

const CARET_PERIOD_MS: u32 = 500;
const DOUBLE_CLICK_MS: u32 = 500;
/// Reported horizontal scroll extent when wrapping is off.
const SCROLL_WIDTH: usize = 2000;

// ── Style state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StyleDef {
    fore: EngineColor,
    back: EngineColor,
    bold: bool,
}

const DEFAULT_STYLE: StyleDef =
    StyleDef { fore: EngineColor::BLACK, back: EngineColor::WHITE, bold: false };

#[derive(Debug, Clone, Copy)]
struct SelectionColors {
    fore: Option<EngineColor>,
    back: EngineColor,
}

#[derive(Debug, Clone, Copy, Default)]
struct WhitespaceColors {
    fore: Option<EngineColor>,
    back: Option<EngineColor>,
}

#[derive(Debug, Clone, Copy)]
struct Click {
    time_ms: u32,
    x: i32,
    y: i32,
}

// ── PlainEngine ───────────────────────────────────────────────────────────────

pub struct PlainEngine {
    doc: Vec<u8>,
    limit: Option<usize>,
    caret: usize,
    anchor: usize,
    modified: bool,

    eol: EolMode,
    wrap: WrapMode,
    use_tabs: bool,
    indent: usize,
    tab_width: usize,
    code_page: CodePage,

    caret_style: CaretStyle,
    overtype_caret_style: CaretStyle,
    overtype: bool,
    margin_left: u32,
    margin_right: u32,
    line_number_width: u32,
    extra_descent: i32,
    extra_line_spacing: bool,
    mouse_down_captures: bool,

    styles: Vec<StyleDef>,
    selection: SelectionColors,
    whitespace: WhitespaceColors,
    caret_fore: EngineColor,

    view: PRect,
    top_row: usize,
    x_offset: usize,
    tentative: Option<Range<usize>>,
    captured: bool,
    last_click: Option<Click>,
    caret_on: bool,
    last_blink_ms: Option<u32>,
    layout: Option<Layout>,
}

impl Default for PlainEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainEngine {
    pub fn new() -> Self {
        let mut styles = vec![DEFAULT_STYLE; STYLE_COUNT];
        styles[usize::from(STYLE_LINENUMBER)].back = EngineColor::rgb(0xC0, 0xC0, 0xC0);
        Self {
            doc: Vec::new(),
            limit: None,
            caret: 0,
            anchor: 0,
            modified: false,
            eol: EolMode::platform_default(),
            wrap: WrapMode::None,
            use_tabs: true,
            indent: 0,
            tab_width: 8,
            code_page: CodePage::Utf8,
            caret_style: CaretStyle::Line,
            overtype_caret_style: CaretStyle::Line,
            overtype: false,
            margin_left: 1,
            margin_right: 1,
            line_number_width: 0,
            extra_descent: 0,
            extra_line_spacing: false,
            mouse_down_captures: true,
            styles,
            selection: SelectionColors { fore: None, back: EngineColor::rgb(0xC0, 0xC0, 0xC0) },
            whitespace: WhitespaceColors::default(),
            caret_fore: EngineColor::BLACK,
            view: PRect::default(),
            top_row: 0,
            x_offset: 0,
            tentative: None,
            captured: false,
            last_click: None,
            caret_on: true,
            last_blink_ms: None,
            layout: None,
        }
    }

    /// Cap document storage at `limit` bytes; larger allocations fail.
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    // ── Geometry ──────────────────────────────────────────────────────────────

    fn line_height(&self) -> usize {
        let spacing = i32::from(self.extra_line_spacing);
        (FONT_ASCENT + FONT_DESCENT + self.extra_descent + spacing).max(1) as usize
    }

    fn text_left(&self) -> usize {
        (self.line_number_width + self.margin_left) as usize
    }

    fn text_columns(&self) -> usize {
        let width = self.view.width().max(0.0).floor() as usize;
        width.saturating_sub(self.text_left() + self.margin_right as usize)
    }

    fn lines_on_screen(&self) -> usize {
        (self.view.height().max(0.0).floor() as usize) / self.line_height()
    }

    fn layout(&mut self) -> &Layout {
        let wrap_width = match self.wrap {
            WrapMode::Word if self.text_columns() > 0 => Some(self.text_columns()),
            _ => None,
        };
        let (doc, code_page, tab_width) = (&self.doc, self.code_page, self.tab_width);
        self.layout.get_or_insert_with(|| layout::build(doc, wrap_width, code_page, tab_width))
    }

    fn relayout(&mut self) {
        self.layout = None;
    }

    fn max_top_row(&mut self) -> usize {
        let los = self.lines_on_screen().max(1);
        self.layout().rows.len().saturating_sub(los)
    }

    // ── Document primitives ───────────────────────────────────────────────────

    fn reserve(&mut self, additional: usize) -> Result<(), OutOfMemory> {
        let requested = self.doc.len().saturating_add(additional);
        if self.limit.is_some_and(|limit| requested > limit) {
            return Err(OutOfMemory { requested });
        }
        self.doc.try_reserve(additional).map_err(|_| OutOfMemory { requested })
    }

    fn mark_modified(&mut self, host: &mut dyn EngineHost) {
        if !self.modified {
            self.modified = true;
            host.notify(Notification::SavePointLeft);
        }
    }

    /// Insert at `pos`.  Positions strictly after `pos` shift; positions equal
    /// to `pos` shift only when `move_equal` is set.
    fn insert(
        &mut self,
        pos: usize,
        bytes: &[u8],
        move_equal: bool,
        host: &mut dyn EngineHost,
    ) -> Result<(), OutOfMemory> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.reserve(bytes.len())?;
        let pos = pos.min(self.doc.len());
        self.doc.splice(pos..pos, bytes.iter().copied());
        let shift = |p: usize| if p > pos || (move_equal && p == pos) { p + bytes.len() } else { p };
        self.caret = shift(self.caret);
        self.anchor = shift(self.anchor);
        self.relayout();
        self.mark_modified(host);
        host.notify(Notification::Modified { position: pos, length_added: bytes.len() as isize });
        Ok(())
    }

    fn delete(&mut self, start: usize, length: usize, host: &mut dyn EngineHost) {
        let start = start.min(self.doc.len());
        let end = start.saturating_add(length).min(self.doc.len());
        if start == end {
            return;
        }
        self.doc.drain(start..end);
        let shift = |p: usize| {
            if p >= end {
                p - (end - start)
            } else if p > start {
                start
            } else {
                p
            }
        };
        self.caret = shift(self.caret);
        self.anchor = shift(self.anchor);
        self.tentative = None;
        self.relayout();
        self.mark_modified(host);
        host.notify(Notification::Modified {
            position: start,
            length_added: -((end - start) as isize),
        });
    }

    /// Remove many runs with a single compaction pass.  Runs that overlap an
    /// earlier one or fall past the end are clipped.
    fn delete_runs(&mut self, runs: &[(usize, usize)], host: &mut dyn EngineHost) -> usize {
        let len = self.doc.len();
        let mut clipped: Vec<Range<usize>> = Vec::with_capacity(runs.len());
        let mut floor = 0;
        for &(start, length) in runs {
            let start = start.clamp(floor, len);
            let end = start.saturating_add(length).min(len);
            if start < end {
                clipped.push(start..end);
                floor = end;
            }
        }
        if clipped.is_empty() {
            return 0;
        }

        let (mut read, mut write) = (0, 0);
        for run in &clipped {
            self.doc.copy_within(read..run.start, write);
            write += run.start - read;
            read = run.end;
        }
        self.doc.copy_within(read..len, write);
        write += len - read;
        self.doc.truncate(write);

        let shift = |p: usize| {
            let mut removed = 0;
            for run in &clipped {
                if p >= run.end {
                    removed += run.len();
                } else {
                    if p > run.start {
                        removed += p - run.start;
                    }
                    break;
                }
            }
            p - removed
        };
        self.caret = shift(self.caret);
        self.anchor = shift(self.anchor);
        self.tentative = None;
        self.relayout();
        self.mark_modified(host);
        // Back to front, so each position is valid once the later runs are gone.
        for run in clipped.iter().rev() {
            host.notify(Notification::Modified {
                position: run.start,
                length_added: -(run.len() as isize),
            });
        }
        len - write
    }

    fn selection(&self) -> Range<usize> {
        self.caret.min(self.anchor)..self.caret.max(self.anchor)
    }

    fn delete_selection(&mut self, host: &mut dyn EngineHost) {
        let sel = self.selection();
        self.delete(sel.start, sel.len(), host);
    }

    /// Replace the selection with `bytes`, caret after the inserted text.
    fn replace_selection(
        &mut self,
        bytes: &[u8],
        host: &mut dyn EngineHost,
    ) -> Result<(), OutOfMemory> {
        self.delete_selection(host);
        let pos = self.caret;
        self.insert(pos, bytes, true, host)?;
        self.anchor = self.caret;
        Ok(())
    }

    fn convert_eols(&self, text: &[u8]) -> Vec<u8> {
        let eol = self.eol.bytes();
        let mut out = Vec::with_capacity(text.len());
        let mut i = 0;
        while i < text.len() {
            match text[i] {
                b'\r' => {
                    out.extend_from_slice(eol);
                    i += if text.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                }
                b'\n' => {
                    out.extend_from_slice(eol);
                    i += 1;
                }
                b => {
                    out.push(b);
                    i += 1;
                }
            }
        }
        out
    }

    fn encode_char(&self, ch: char) -> Vec<u8> {
        match self.code_page {
            CodePage::Utf8 => ch.to_string().into_bytes(),
            CodePage::SingleByte => vec![u8::try_from(u32::from(ch)).unwrap_or(b'?')],
        }
    }

    // ── Caret movement ────────────────────────────────────────────────────────

    fn next_pos(&self, pos: usize) -> usize {
        if self.doc.get(pos..pos + 2) == Some(b"\r\n") {
            return pos + 2;
        }
        (pos + layout::char_len(&self.doc, pos, self.code_page).max(1)).min(self.doc.len())
    }

    fn prev_pos(&self, pos: usize) -> usize {
        if pos == 0 {
            return 0;
        }
        if pos >= 2 && &self.doc[pos - 2..pos] == b"\r\n" {
            return pos - 2;
        }
        let mut p = pos - 1;
        if self.code_page == CodePage::Utf8 {
            while p > 0 && pos - p < 4 && (self.doc[p] & 0xC0) == 0x80 {
                p -= 1;
            }
            if layout::char_len(&self.doc, p, self.code_page) != pos - p {
                p = pos - 1;
            }
        }
        p
    }

    fn is_word_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
    }

    fn word_right(&self, mut pos: usize) -> usize {
        let start = pos;
        let len = self.doc.len();
        while pos < len && Self::is_word_byte(self.doc[pos]) {
            pos += 1;
        }
        while pos < len && matches!(self.doc[pos], b' ' | b'\t') {
            pos += 1;
        }
        if pos == start {
            self.next_pos(pos)
        } else {
            pos
        }
    }

    fn word_left(&self, mut pos: usize) -> usize {
        while pos > 0 && !Self::is_word_byte(self.doc[pos - 1]) {
            pos -= 1;
        }
        while pos > 0 && Self::is_word_byte(self.doc[pos - 1]) {
            pos -= 1;
        }
        pos
    }

    fn word_at(&self, pos: usize) -> Range<usize> {
        let mut start = pos.min(self.doc.len());
        let mut end = start;
        while start > 0 && Self::is_word_byte(self.doc[start - 1]) {
            start -= 1;
        }
        while end < self.doc.len() && Self::is_word_byte(self.doc[end]) {
            end += 1;
        }
        start..end
    }

    fn move_caret(&mut self, pos: usize, extend: bool, host: &mut dyn EngineHost) {
        self.caret = pos.min(self.doc.len());
        if !extend {
            self.anchor = self.caret;
        }
        self.caret_on = true;
        self.last_blink_ms = None;
        host.notify(Notification::UpdateUi);
    }

    fn line_start(&mut self, line: usize) -> usize {
        let len = self.doc.len();
        let lines = &self.layout().lines;
        lines.get(line).map_or(len, |l| l.start)
    }

    fn line_end(&mut self, line: usize) -> usize {
        let len = self.doc.len();
        let lines = &self.layout().lines;
        lines.get(line).map_or(len, |l| l.end)
    }

    fn line_of(&mut self, pos: usize) -> usize {
        self.layout().line_of(pos)
    }

    fn column(&mut self, pos: usize) -> usize {
        let line = self.line_of(pos);
        let (start, end) = (self.line_start(line), self.line_end(line));
        layout::column_of(&self.doc, start, end, pos, self.code_page, self.tab_width)
    }

    /// Position on `line` at the caret's current column.
    fn vertical_target(&mut self, line: usize) -> usize {
        let col = self.column(self.caret);
        let (start, end) = (self.line_start(line), self.line_end(line));
        layout::position_at_column(&self.doc, start, end, col, self.code_page, self.tab_width)
    }

    fn line_count(&mut self) -> usize {
        self.layout().lines.len()
    }

    // ── Scrolling ─────────────────────────────────────────────────────────────

    fn ensure_caret_visible(&mut self) {
        let caret = self.caret;
        let row = self.layout().row_of(caret);
        let los = self.lines_on_screen().max(1);
        if row < self.top_row {
            self.top_row = row;
        } else if row >= self.top_row + los {
            self.top_row = row + 1 - los;
        }
        if self.wrap == WrapMode::None {
            let cols = self.text_columns().max(1);
            let col = self.row_column(caret);
            if col < self.x_offset {
                self.x_offset = col;
            } else if col >= self.x_offset + cols {
                self.x_offset = col + 1 - cols;
            }
        } else {
            self.x_offset = 0;
        }
    }

    fn row_column(&mut self, pos: usize) -> usize {
        let layout = self.layout();
        let row = layout.rows[layout.row_of(pos)];
        layout::column_of(&self.doc, row.start, row.end, pos, self.code_page, self.tab_width)
    }

    /// Redraw everything and report the scroll state to the host.
    fn refresh(&mut self, host: &mut dyn EngineHost) {
        let max_top = self.max_top_row();
        self.top_row = self.top_row.min(max_top);
        host.set_vertical_scroll_pos(self.top_row, max_top);
        if self.wrap == WrapMode::None {
            let extent = SCROLL_WIDTH.max(self.x_offset + self.text_columns());
            host.set_horizontal_scroll_pos(self.x_offset, extent);
        }
        host.invalidate(self.view);
    }

    /// After an edit or caret move: scroll the caret into view and redraw.
    fn follow_caret(&mut self, host: &mut dyn EngineHost) {
        self.ensure_caret_visible();
        self.refresh(host);
    }

    fn scroll_to(&mut self, top: usize, host: &mut dyn EngineHost) {
        self.top_row = top.min(self.max_top_row());
        self.refresh(host);
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    fn key_down(
        &mut self,
        key: Key,
        mods: Modifiers,
        host: &mut dyn EngineHost,
    ) -> Result<bool, OutOfMemory> {
        let shift = mods.contains(Modifiers::SHIFT);
        let ctrl = mods.contains(Modifiers::CTRL);
        let collapse = |this: &Self, forward: bool| {
            let sel = this.selection();
            if forward { sel.end } else { sel.start }
        };
        match key {
            Key::Left => {
                let to = if ctrl {
                    self.word_left(self.caret)
                } else if !shift && self.caret != self.anchor {
                    collapse(self, false)
                } else {
                    self.prev_pos(self.caret)
                };
                self.move_caret(to, shift, host);
            }
            Key::Right => {
                let to = if ctrl {
                    self.word_right(self.caret)
                } else if !shift && self.caret != self.anchor {
                    collapse(self, true)
                } else {
                    self.next_pos(self.caret)
                };
                self.move_caret(to, shift, host);
            }
            Key::Up | Key::Down | Key::Prior | Key::Next => {
                let line = self.line_of(self.caret);
                let step = match key {
                    Key::Prior | Key::Next => self.lines_on_screen().max(1),
                    _ => 1,
                };
                let target = match key {
                    Key::Up | Key::Prior => line.saturating_sub(step),
                    _ => (line + step).min(self.line_count() - 1),
                };
                let to = self.vertical_target(target);
                self.move_caret(to, shift, host);
            }
            Key::Home => {
                let to = if ctrl {
                    0
                } else {
                    let line = self.line_of(self.caret);
                    self.line_start(line)
                };
                self.move_caret(to, shift, host);
            }
            Key::End => {
                let to = if ctrl {
                    self.doc.len()
                } else {
                    let line = self.line_of(self.caret);
                    self.line_end(line)
                };
                self.move_caret(to, shift, host);
            }
            Key::Delete => {
                if self.caret != self.anchor {
                    self.delete_selection(host);
                } else {
                    let next = self.next_pos(self.caret);
                    self.delete(self.caret, next - self.caret, host);
                }
            }
            Key::Back => {
                if self.caret != self.anchor {
                    self.delete_selection(host);
                } else {
                    let prev = self.prev_pos(self.caret);
                    self.delete(prev, self.caret - prev, host);
                }
            }
            Key::Tab if shift => self.unindent_line(host),
            Key::Tab => {
                let fill = self.indent_fill();
                self.replace_selection(&fill, host)?;
            }
            Key::Return => {
                let eol = self.eol.bytes();
                self.replace_selection(eol, host)?;
            }
            Key::Insert => self.overtype = !self.overtype,
            Key::Escape => {
                let caret = self.caret;
                self.move_caret(caret, false, host);
            }
            Key::Char(code) if ctrl => match char::from_u32(code).map(|c| c.to_ascii_uppercase()) {
                Some('A') => self.select_all(host),
                Some('C') => self.copy(host),
                Some('X') => self.cut(host),
                Some('V') => self.paste(host)?,
                _ => return Ok(false),
            },
            Key::Char(_) => return Ok(false),
        }
        self.follow_caret(host);
        Ok(true)
    }

    fn indent_fill(&mut self) -> Vec<u8> {
        if self.use_tabs {
            return vec![b'\t'];
        }
        let width = if self.indent == 0 { self.tab_width } else { self.indent }.max(1);
        let col = self.column(self.caret);
        vec![b' '; width - col % width]
    }

    fn unindent_line(&mut self, host: &mut dyn EngineHost) {
        let line = self.line_of(self.caret);
        let start = self.line_start(line);
        let width = if self.indent == 0 { self.tab_width } else { self.indent }.max(1);
        let remove = match self.doc.get(start) {
            Some(b'\t') => 1,
            _ => self.doc[start..].iter().take(width).take_while(|&&b| b == b' ').count(),
        };
        self.delete(start, remove, host);
    }

    fn select_all(&mut self, host: &mut dyn EngineHost) {
        self.anchor = 0;
        self.caret = self.doc.len();
        host.notify(Notification::UpdateUi);
    }

    fn copy(&mut self, host: &mut dyn EngineHost) {
        let sel = self.selection();
        if !sel.is_empty() {
            host.copy_to_clipboard(&self.doc[sel]);
        }
    }

    fn cut(&mut self, host: &mut dyn EngineHost) {
        self.copy(host);
        self.delete_selection(host);
    }

    fn paste(&mut self, host: &mut dyn EngineHost) -> Result<(), OutOfMemory> {
        let text = host.clipboard_text();
        self.insert_paste(&text, host)
    }

    fn insert_paste(&mut self, text: &[u8], host: &mut dyn EngineHost) -> Result<(), OutOfMemory> {
        let converted = self.convert_eols(text);
        self.replace_selection(&converted, host)
    }

    // ── Character input ───────────────────────────────────────────────────────

    fn insert_character(
        &mut self,
        ch: char,
        source: CharacterSource,
        host: &mut dyn EngineHost,
    ) -> Result<(), OutOfMemory> {
        let bytes = self.encode_char(ch);
        if self.overtype && self.caret == self.anchor {
            let line = self.line_of(self.caret);
            if self.caret < self.line_end(line) {
                let next = self.next_pos(self.caret);
                self.delete(self.caret, next - self.caret, host);
            }
        }
        let keep = self.tentative.take();
        self.replace_selection(&bytes, host)?;
        self.tentative = match source {
            CharacterSource::Direct => None,
            CharacterSource::Tentative => {
                let end = self.caret;
                let start = keep.map_or(end - bytes.len(), |r| r.start.min(end - bytes.len()));
                Some(start..end)
            }
        };
        self.follow_caret(host);
        Ok(())
    }

    fn clear_tentative(&mut self, host: &mut dyn EngineHost) {
        if let Some(range) = self.tentative.take() {
            self.delete(range.start, range.len(), host);
            self.follow_caret(host);
        }
    }

    // ── Mouse ─────────────────────────────────────────────────────────────────

    fn position_from_point(&mut self, x: i32, y: i32) -> usize {
        let lh = self.line_height() as i32;
        let row_on_screen = (y.max(0) / lh) as usize;
        let col = (x - self.text_left() as i32).max(0) as usize + self.x_offset;
        let top = self.top_row;
        let layout = self.layout();
        let Some(row) = layout.rows.get((top + row_on_screen).min(layout.rows.len() - 1)).copied()
        else {
            return 0;
        };
        layout::position_at_column(&self.doc, row.start, row.end, col, self.code_page, self.tab_width)
    }

    fn mouse(&mut self, input: MouseInput, host: &mut dyn EngineHost) -> bool {
        match input.action {
            MouseAction::ButtonDown => {
                let pos = self.position_from_point(input.x, input.y);
                let double = self.last_click.is_some_and(|c| {
                    input.time_ms.wrapping_sub(c.time_ms) <= DOUBLE_CLICK_MS
                        && c.x == input.x
                        && c.y == input.y
                });
                if double {
                    let word = self.word_at(pos);
                    self.anchor = word.start;
                    self.move_caret(word.end, true, host);
                    self.last_click = None;
                } else {
                    self.move_caret(pos, input.modifiers.contains(Modifiers::SHIFT), host);
                    self.last_click = Some(Click { time_ms: input.time_ms, x: input.x, y: input.y });
                }
                self.captured = self.mouse_down_captures;
                self.follow_caret(host);
                true
            }
            MouseAction::Move if self.captured => {
                let pos = self.position_from_point(input.x, input.y);
                self.move_caret(pos, true, host);
                self.follow_caret(host);
                true
            }
            MouseAction::Move => false,
            MouseAction::ButtonUp => std::mem::replace(&mut self.captured, false),
        }
    }

    // ── Idle ──────────────────────────────────────────────────────────────────

    fn idle(&mut self, now_ms: u32, host: &mut dyn EngineHost) -> bool {
        match self.last_blink_ms {
            None => self.last_blink_ms = Some(now_ms),
            Some(last) if now_ms.wrapping_sub(last) >= CARET_PERIOD_MS => {
                self.caret_on = !self.caret_on;
                self.last_blink_ms = Some(now_ms);
                host.invalidate(self.caret_rect());
            }
            Some(_) => {}
        }
        true
    }

    fn caret_rect(&mut self) -> PRect {
        let x = self.point_x(self.caret) as f64;
        let y = self.point_y(self.caret) as f64;
        PRect::new(x, y, x + 1.0, y + self.line_height() as f64)
    }

    fn point_x(&mut self, pos: usize) -> isize {
        let col = self.row_column(pos) as isize;
        self.text_left() as isize + col - self.x_offset as isize
    }

    fn point_y(&mut self, pos: usize) -> isize {
        let row = self.layout().row_of(pos) as isize;
        (row - self.top_row as isize) * self.line_height() as isize
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

fn flag(b: bool) -> isize {
    isize::from(b)
}

impl Engine for PlainEngine {
    fn dispatch(
        &mut self,
        cmd: Command<'_>,
        host: &mut dyn EngineHost,
    ) -> Result<isize, OutOfMemory> {
        trace!(?cmd, "dispatch");
        let reply = match cmd {
            Command::Allocate(bytes) => {
                let additional = bytes.saturating_sub(self.doc.len());
                self.reserve(additional)?;
                0
            }
            Command::AppendText(text) => {
                let end = self.doc.len();
                self.insert(end, text, false, host)?;
                host.invalidate(self.view);
                0
            }
            Command::ClearAll => {
                let len = self.doc.len();
                self.delete(0, len, host);
                self.top_row = 0;
                self.x_offset = 0;
                self.refresh(host);
                0
            }
            Command::GetLength => self.doc.len() as isize,
            Command::GetTextRange { start, buf } => {
                let start = start.min(self.doc.len());
                let n = buf.len().min(self.doc.len() - start);
                buf[..n].copy_from_slice(&self.doc[start..start + n]);
                n as isize
            }
            Command::GetCharAt(pos) => self.doc.get(pos).copied().map_or(0, isize::from),
            Command::DeleteRange { start, length } => {
                self.delete(start, length, host);
                self.refresh(host);
                0
            }
            Command::DeleteRanges(runs) => {
                let removed = self.delete_runs(runs, host);
                if removed > 0 {
                    self.refresh(host);
                }
                removed as isize
            }
            Command::GetLineCount => self.line_count() as isize,
            Command::LineFromPosition(pos) => self.line_of(pos) as isize,
            Command::PositionFromLine(line) => self.line_start(line) as isize,
            Command::GetLineEndPosition(line) => self.line_end(line) as isize,
            Command::GetColumn(pos) => self.column(pos) as isize,

            Command::SetSavePoint => {
                if std::mem::replace(&mut self.modified, false) {
                    host.notify(Notification::SavePointReached);
                }
                0
            }
            Command::GetModify => flag(self.modified),

            Command::SetEolMode(eol) => {
                self.eol = eol;
                0
            }
            Command::GetEolMode => self.eol.to_reply(),
            Command::SetWrapMode(wrap) => {
                self.wrap = wrap;
                self.x_offset = 0;
                self.relayout();
                self.refresh(host);
                0
            }
            Command::GetWrapMode => flag(self.wrap == WrapMode::Word),
            Command::SetUseTabs(use_tabs) => {
                self.use_tabs = use_tabs;
                0
            }
            Command::GetUseTabs => flag(self.use_tabs),
            Command::SetIndent(width) => {
                self.indent = width;
                0
            }
            Command::GetIndent => self.indent as isize,
            Command::SetTabWidth(width) => {
                self.tab_width = width.max(1);
                self.relayout();
                0
            }
            Command::GetTabWidth => self.tab_width as isize,
            Command::SetCodePage(code_page) => {
                self.code_page = code_page;
                self.relayout();
                0
            }

            Command::SetCaretStyle(style) => {
                self.caret_style = style;
                0
            }
            Command::SetOvertypeCaretStyle(style) => {
                self.overtype_caret_style = style;
                0
            }
            Command::GetCaretStyle => flag(self.caret_style == CaretStyle::Block),
            Command::SetOvertype(on) => {
                self.overtype = on;
                0
            }
            Command::GetOvertype => flag(self.overtype),
            Command::SetMarginLeft(width) => {
                self.margin_left = width;
                self.relayout();
                0
            }
            Command::SetMarginRight(width) => {
                self.margin_right = width;
                self.relayout();
                0
            }
            Command::SetLineNumberWidth(width) => {
                self.line_number_width = width;
                self.relayout();
                self.refresh(host);
                0
            }
            Command::GetLineNumberWidth => self.line_number_width as isize,
            Command::SetExtraDescent(descent) => {
                self.extra_descent = descent;
                0
            }
            Command::SetExtraLineSpacing(on) => {
                self.extra_line_spacing = on;
                0
            }
            Command::SetMouseDownCaptures(on) => {
                self.mouse_down_captures = on;
                0
            }
            Command::TextHeight => self.line_height() as isize,

            Command::StyleSetFore(style, color) => {
                self.styles[usize::from(style)].fore = color;
                0
            }
            Command::StyleSetBack(style, color) => {
                self.styles[usize::from(style)].back = color;
                0
            }
            Command::StyleGetFore(style) => self.styles[usize::from(style)].fore.0 as isize,
            Command::StyleGetBack(style) => self.styles[usize::from(style)].back.0 as isize,
            Command::StyleSetBold(style, bold) => {
                self.styles[usize::from(style)].bold = bold;
                0
            }
            Command::StyleClearAll => {
                let default = self.styles[usize::from(STYLE_DEFAULT)];
                self.styles.fill(default);
                host.invalidate(self.view);
                0
            }
            Command::SetSelectionColors { fore, back } => {
                self.selection = SelectionColors { fore, back };
                0
            }
            Command::SetWhitespaceColors { fore, back } => {
                self.whitespace = WhitespaceColors { fore, back };
                0
            }
            Command::SetCaretFore(color) => {
                self.caret_fore = color;
                0
            }

            Command::SizeChanged => {
                self.view = host.editor_size();
                self.relayout();
                self.refresh(host);
                0
            }
            Command::ClearTentativeStart => {
                self.clear_tentative(host);
                0
            }
            Command::InsertPasteStream(text) => {
                self.insert_paste(text, host)?;
                self.follow_caret(host);
                0
            }
            Command::InsertCharacter { ch, source } => {
                self.insert_character(ch, source, host)?;
                0
            }
            Command::IdleWork { now_ms } => flag(self.idle(now_ms, host)),
            Command::KeyDown { key, modifiers } => flag(self.key_down(key, modifiers, host)?),
            Command::Mouse(input) => flag(self.mouse(input, host)),
            Command::Paint { surface, area } => {
                self.paint(surface, area);
                0
            }

            Command::GetCurrentPos => self.caret as isize,
            Command::GetAnchor => self.anchor as isize,
            Command::GotoPos(pos) => {
                self.move_caret(pos, false, host);
                self.follow_caret(host);
                0
            }
            Command::SetSel { anchor, caret } => {
                self.anchor = anchor.min(self.doc.len());
                self.move_caret(caret, true, host);
                self.follow_caret(host);
                0
            }
            Command::SelectAll => {
                self.select_all(host);
                self.refresh(host);
                0
            }
            Command::PointXFromPosition(pos) => self.point_x(pos.min(self.doc.len())),
            Command::PointYFromPosition(pos) => self.point_y(pos.min(self.doc.len())),

            Command::GetFirstVisibleLine => self.top_row as isize,
            Command::SetFirstVisibleLine(row) => {
                self.scroll_to(row, host);
                0
            }
            Command::LinesOnScreen => self.lines_on_screen() as isize,
            Command::LineScroll(delta) => {
                let top = self.top_row.saturating_add_signed(delta);
                self.scroll_to(top, host);
                0
            }

            Command::Copy => {
                self.copy(host);
                0
            }
            Command::Cut => {
                self.cut(host);
                self.follow_caret(host);
                0
            }
            Command::Paste => {
                self.paste(host)?;
                self.follow_caret(host);
                0
            }
        };
        Ok(reply)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
