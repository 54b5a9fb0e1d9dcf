// ── File editor state ─────────────────────────────────────────────────────────
//
// Ties a file path, an engine handle and per-document metadata together, and
// sequences the whole-file operations: open (handle + chunked load), save
// (normalise + chunked save), dialog-driven variants of both, and language
// detection.  Errors are values; whether they also become a modal message is
// chosen per call site with `FileOptions::SHOW_ERROR`.

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use bitflags::bitflags;
use tracing::{debug, info, warn};

use crate::{
    dialogs::{self, Buttons, CwdGuard, FilePicker, MessageBox, Reply, Severity},
    editor::{Clipboard, Command, EditorHandle, PlainEngine},
    error::{EditorError, Result},
    languages::{BuiltinDetector, Language, LanguageDetector},
    settings::EditorSettings,
    storage::{self, IoPolicy},
    theme,
};

/// Bytes of content handed to the language detector.
const DETECT_HEAD: usize = 256;

bitflags! {
    /// Per-call options for open and save.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileOptions: u8 {
        /// Surface failures through the `MessageBox` as well as returning them.
        const SHOW_ERROR = 1;
    }
}

/// Line-number visibility.  `Default` means nobody has chosen yet, which
/// lets the first successful language detection turn them on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineNumbers {
    #[default]
    Default,
    Shown,
    Hidden,
}

impl LineNumbers {
    pub fn is_shown(self) -> bool {
        self == LineNumbers::Shown
    }
}

/// Show `err` as a modal error if `options` asks for it.
pub fn report_error(err: &EditorError, options: FileOptions, messages: &mut dyn MessageBox) {
    warn!(%err, "file operation failed");
    if options.contains(FileOptions::SHOW_ERROR) {
        messages.show(&err.to_string(), Severity::Error, Buttons::Ok);
    }
}

// ── FileEditorState ───────────────────────────────────────────────────────────

pub struct FileEditorState {
    handle: EditorHandle,
    path: Option<PathBuf>,
    language: Language,
    line_numbers: LineNumbers,
    dark_mode: bool,
    policy: IoPolicy,
    detector: Box<dyn LanguageDetector>,
    last_error: Option<String>,
}

impl std::fmt::Debug for FileEditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileEditorState")
            .field("path", &self.path)
            .field("language", &self.language)
            .field("line_numbers", &self.line_numbers)
            .finish_non_exhaustive()
    }
}

impl FileEditorState {
    fn create_handle(settings: &EditorSettings, clipboard: Rc<dyn Clipboard>) -> EditorHandle {
        let engine = match settings.allocation_limit {
            Some(limit) => PlainEngine::new().with_allocation_limit(limit),
            None => PlainEngine::new(),
        };
        let mut handle = EditorHandle::with_engine(Box::new(engine), clipboard);
        handle.set_word_wrap(settings.word_wrap);
        theme::apply_theme(&mut handle, settings.dark_mode);
        handle
    }

    fn from_handle(handle: EditorHandle, path: Option<PathBuf>, settings: &EditorSettings) -> Self {
        let line_numbers = match settings.line_numbers {
            Some(true) => LineNumbers::Shown,
            Some(false) => LineNumbers::Hidden,
            None => LineNumbers::Default,
        };
        let mut state = Self {
            handle,
            path,
            language: Language::None,
            line_numbers,
            dark_mode: settings.dark_mode,
            policy: settings.io_policy(),
            detector: Box::new(BuiltinDetector),
            last_error: None,
        };
        state.update_line_number_width();
        state
    }

    /// An empty document with no path.
    pub fn new_untitled(settings: &EditorSettings, clipboard: Rc<dyn Clipboard>) -> Self {
        let handle = Self::create_handle(settings, clipboard);
        Self::from_handle(handle, None, settings)
    }

    /// Create a handle and load `path` into it.  On failure the handle is
    /// destroyed and only the error comes back.
    pub fn open_file(
        path: &Path,
        settings: &EditorSettings,
        clipboard: Rc<dyn Clipboard>,
        options: FileOptions,
        messages: &mut dyn MessageBox,
    ) -> Result<Self> {
        let mut handle = Self::create_handle(settings, clipboard);
        match storage::load(&mut handle, path, &settings.io_policy()) {
            Ok(report) => {
                debug!(path = %path.display(), ?report, "opened");
                let mut state = Self::from_handle(handle, Some(path.to_path_buf()), settings);
                state.detect_language();
                Ok(state)
            }
            Err(err) => {
                handle.destroy();
                report_error(&err, options, messages);
                Err(err)
            }
        }
    }

    /// Let the user pick a file, starting in `dir`.  The picker stays open
    /// while the chosen file fails to open (each failure is shown); `None`
    /// when the user cancels.
    pub fn open_file_with_dialog(
        dir: Option<&Path>,
        settings: &EditorSettings,
        clipboard: Rc<dyn Clipboard>,
        picker: &mut dyn FilePicker,
        messages: &mut dyn MessageBox,
    ) -> Option<Self> {
        // Pickers resolve what the user typed against the working directory.
        let _cwd = CwdGuard::new(dir);
        let mut opened = None;
        picker.pick("Open file", &mut |chosen: &Path| {
            let path = match dialogs::expand_path(chosen) {
                Ok(path) => path,
                Err(err) => {
                    report_error(&err, FileOptions::SHOW_ERROR, messages);
                    return false;
                }
            };
            match Self::open_file(&path, settings, clipboard.clone(), FileOptions::SHOW_ERROR, messages) {
                Ok(state) => {
                    opened = Some(state);
                    true
                }
                Err(_) => false,
            }
        });
        opened
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn handle(&self) -> &EditorHandle {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut EditorHandle {
        &mut self.handle
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn line_numbers(&self) -> LineNumbers {
        self.line_numbers
    }

    /// Replace the language classifier.
    pub fn set_detector(&mut self, detector: Box<dyn LanguageDetector>) {
        self.detector = detector;
    }

    /// The last error from a call made without `SHOW_ERROR`, clearing it.
    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// `name` or `*name` when modified; `Untitled` stands in for a missing path.
    pub fn title(&mut self) -> String {
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| "Untitled".to_owned(), |n| n.to_string_lossy().into_owned());
        if self.handle.is_modified() {
            format!("*{name}")
        } else {
            name
        }
    }

    // ── Save ──────────────────────────────────────────────────────────────────

    /// Normalise, then save to the known path or (without one) through the
    /// picker.  Returns `true` on success.
    pub fn save_file(&mut self, picker: &mut dyn FilePicker, messages: &mut dyn MessageBox) -> bool {
        self.before_save();
        let saved = match self.path.clone() {
            Some(path) => self.save_to(&path, FileOptions::SHOW_ERROR, messages),
            None => match self.save_file_with_dialog(picker, messages) {
                Some(path) => {
                    self.path = Some(path);
                    true
                }
                None => false,
            },
        };
        if saved {
            self.after_save();
        }
        saved
    }

    /// Ask for a destination.  An existing file is only overwritten after the
    /// user confirms; declining (or a failed save) returns to the picker.
    /// Returns the path written, `None` when the user cancelled.
    pub fn save_file_with_dialog(
        &mut self,
        picker: &mut dyn FilePicker,
        messages: &mut dyn MessageBox,
    ) -> Option<PathBuf> {
        let mut written = None;
        picker.pick("Save file as", &mut |chosen: &Path| {
            let path = match dialogs::expand_path(chosen) {
                Ok(path) => path,
                Err(err) => {
                    report_error(&err, FileOptions::SHOW_ERROR, messages);
                    return false;
                }
            };
            if !can_overwrite(&path, messages) {
                return false;
            }
            if self.save_to(&path, FileOptions::SHOW_ERROR, messages) {
                written = Some(path);
                true
            } else {
                false
            }
        });
        written
    }

    /// Write the document to `path` without touching `self.path`.
    pub fn save_to(&mut self, path: &Path, options: FileOptions, messages: &mut dyn MessageBox) -> bool {
        match storage::save(&mut self.handle, path, &self.policy) {
            Ok(_) => true,
            Err(err) => {
                report_error(&err, options, messages);
                if !options.contains(FileOptions::SHOW_ERROR) {
                    self.last_error = Some(err.to_string());
                }
                false
            }
        }
    }

    /// True when the document may be replaced or closed: it has no unsaved
    /// changes, or the user agreed to drop them.
    pub fn confirm_discard(&mut self, messages: &mut dyn MessageBox) -> bool {
        if !self.handle.is_modified() {
            return true;
        }
        let title = self.title();
        let question = format!("Discard unsaved changes to '{}'?", title.trim_start_matches('*'));
        messages.show(&question, Severity::Confirmation, Buttons::YesNo) == Reply::Yes
    }

    /// Strip trailing blanks from every line and make sure the document ends
    /// with a line break.  A document still at its save point is left alone.
    pub fn before_save(&mut self) {
        if !self.handle.is_modified() {
            return;
        }
        strip_trailing_spaces(&mut self.handle, self.policy.chunk_size);
        ensure_newline_at_end(&mut self.handle);
    }

    /// Mark the document clean; detect a language if none is set yet.
    pub fn after_save(&mut self) {
        self.handle.set_save_point();
        if self.language == Language::None {
            self.detect_language();
        }
    }

    // ── Language and view flags ───────────────────────────────────────────────

    /// Run the classifier.  On the transition from no language to some
    /// language, line numbers are turned on unless someone chose otherwise.
    /// Returns whether the language changed.
    pub fn detect_language(&mut self) -> bool {
        let Some(path) = self.path.as_deref() else {
            return false;
        };
        let mut head = [0u8; DETECT_HEAD];
        let n = self.handle.text_range(0, &mut head);
        let detected = self.detector.detect(path, &head[..n]);
        let previous = std::mem::replace(&mut self.language, detected);
        if previous == detected {
            return false;
        }
        info!(path = %path.display(), from = ?previous, to = ?detected, "language detected");
        if previous == Language::None && self.line_numbers == LineNumbers::Default {
            self.line_numbers = LineNumbers::Shown;
            self.update_line_number_width();
        }
        true
    }

    pub fn toggle_line_numbers(&mut self) {
        self.line_numbers = if self.line_numbers.is_shown() {
            LineNumbers::Hidden
        } else {
            LineNumbers::Shown
        };
        self.update_line_number_width();
    }

    /// Size the line-number margin for the current line count.  Hosts call
    /// this after edits that may add digits.
    pub fn update_line_number_width(&mut self) {
        let width = if self.line_numbers.is_shown() {
            let lines = self.handle.send(Command::GetLineCount).max(1);
            lines.ilog10() + 2
        } else {
            0
        };
        if self.handle.line_number_width() != width {
            self.handle.set_line_number_width(width);
        }
    }

    pub fn set_word_wrap(&mut self, enabled: bool) {
        self.handle.set_word_wrap(enabled);
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
        theme::apply_theme(&mut self.handle, dark);
    }
}

// ── Save helpers ──────────────────────────────────────────────────────────────

fn can_overwrite(path: &Path, messages: &mut dyn MessageBox) -> bool {
    if !path.exists() {
        return true;
    }
    let question = format!("'{}' already exists. Overwrite?", path.display());
    messages.show(&question, Severity::Confirmation, Buttons::YesNo) == Reply::Yes
}

/// Trailing `(start, length)` blank runs, found in one pass over the text.
fn trailing_blank_runs(handle: &mut EditorHandle, chunk_size: usize) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut blank_from: Option<usize> = None;
    let mut pos = 0;
    loop {
        let n = handle.text_range(pos, &mut buf);
        if n == 0 {
            break;
        }
        for (i, &byte) in buf[..n].iter().enumerate() {
            match byte {
                b' ' | b'\t' => {
                    blank_from.get_or_insert(pos + i);
                }
                b'\r' | b'\n' => {
                    if let Some(from) = blank_from.take() {
                        runs.push((from, pos + i - from));
                    }
                }
                _ => blank_from = None,
            }
        }
        pos += n;
    }
    if let Some(from) = blank_from {
        runs.push((from, pos - from));
    }
    runs
}

fn strip_trailing_spaces(handle: &mut EditorHandle, chunk_size: usize) {
    let runs = trailing_blank_runs(handle, chunk_size);
    if runs.is_empty() {
        return;
    }
    let removed = handle.send(Command::DeleteRanges(&runs));
    debug!(runs = runs.len(), removed, "trailing blanks stripped");
}

fn ensure_newline_at_end(handle: &mut EditorHandle) {
    let len = handle.len();
    if len == 0 {
        return;
    }
    let last = handle.send(Command::GetCharAt(len - 1));
    if last == isize::from(b'\n') || last == isize::from(b'\r') {
        return;
    }
    let eol = handle.eol_mode().bytes();
    if let Err(oom) = handle.dispatch(Command::AppendText(eol)) {
        warn!(%oom, "no room for the final line break");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        dialogs::{ScriptedMessages, ScriptedPicker},
        editor::{EolMode, MemoryClipboard},
    };

    fn clipboard() -> Rc<dyn Clipboard> {
        Rc::new(MemoryClipboard::new())
    }

    fn untitled() -> FileEditorState {
        FileEditorState::new_untitled(&EditorSettings::default(), clipboard())
    }

    fn type_text(state: &mut FileEditorState, text: &[u8]) {
        let h = state.handle_mut();
        let end = h.len();
        h.send(Command::GotoPos(end));
        h.dispatch(Command::InsertPasteStream(text)).unwrap();
    }

    #[test]
    fn untitled_title_and_dirty_marker() {
        let mut s = untitled();
        assert_eq!(s.title(), "Untitled");
        type_text(&mut s, b"x");
        assert_eq!(s.title(), "*Untitled");
        assert_eq!(s.language(), Language::None);
    }

    #[test]
    fn open_missing_file_reports_once() {
        let mut msgs = ScriptedMessages::default();
        let err = FileEditorState::open_file(
            Path::new("/no/such/file"),
            &EditorSettings::default(),
            clipboard(),
            FileOptions::SHOW_ERROR,
            &mut msgs,
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::OpenFailed { .. }));
        assert_eq!(msgs.count(Severity::Error), 1);
        assert!(msgs.shown[0].0.contains("/no/such/file"));

        let mut quiet = ScriptedMessages::default();
        let _ = FileEditorState::open_file(
            Path::new("/no/such/file"),
            &EditorSettings::default(),
            clipboard(),
            FileOptions::empty(),
            &mut quiet,
        );
        assert!(quiet.shown.is_empty());
    }

    #[test]
    fn open_detects_language_and_shows_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        std::fs::write(&path, b"fn main() {}\n").unwrap();
        let mut msgs = ScriptedMessages::default();
        let mut s = FileEditorState::open_file(
            &path,
            &EditorSettings::default(),
            clipboard(),
            FileOptions::SHOW_ERROR,
            &mut msgs,
        )
        .unwrap();
        assert_eq!(s.language(), Language::Rust);
        assert_eq!(s.line_numbers(), LineNumbers::Shown);
        assert_eq!(s.handle_mut().line_number_width(), 2);
        assert_eq!(s.title(), "main.rs");
    }

    #[test]
    fn forced_line_number_preference_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.rs");
        std::fs::write(&path, b"fn main() {}\n").unwrap();
        let settings = EditorSettings { line_numbers: Some(false), ..EditorSettings::default() };
        let s = FileEditorState::open_file(
            &path,
            &settings,
            clipboard(),
            FileOptions::empty(),
            &mut ScriptedMessages::default(),
        )
        .unwrap();
        assert_eq!(s.language(), Language::Rust);
        assert_eq!(s.line_numbers(), LineNumbers::Hidden);
    }

    #[test]
    fn before_save_strips_and_terminates() {
        let mut s = untitled();
        type_text(&mut s, b"a  \nb\t\n  \nc ");
        s.before_save();
        assert_eq!(s.handle_mut().text(), b"a\nb\n\nc\n".to_vec());
        s.before_save();
        assert_eq!(s.handle_mut().text(), b"a\nb\n\nc\n".to_vec());
    }

    #[test]
    fn before_save_normalises_many_lines() {
        const LINES: usize = 5000;
        let mut s = untitled();
        let h = s.handle_mut();
        h.send(Command::SetEolMode(EolMode::Lf));
        for i in 0..LINES {
            let line = format!("line {i} of text \t \n");
            h.dispatch(Command::AppendText(line.as_bytes())).unwrap();
        }
        h.dispatch(Command::AppendText(b"tail   ")).unwrap();
        s.before_save();

        let mut expected: String = (0..LINES).map(|i| format!("line {i} of text\n")).collect();
        expected.push_str("tail\n");
        assert_eq!(String::from_utf8(s.handle_mut().text()).unwrap(), expected);
        assert_eq!(s.handle_mut().send(Command::GetLineCount), LINES as isize + 2);
    }

    #[test]
    fn blank_runs_survive_chunk_boundaries() {
        let mut s = untitled();
        s.handle_mut().dispatch(Command::AppendText(b"ab   \r\ncd\t\n \nx  ")).unwrap();
        let whole = trailing_blank_runs(s.handle_mut(), 1024);
        assert_eq!(whole, [(2, 3), (9, 1), (11, 1), (14, 2)]);
        for chunk in 1..8 {
            assert_eq!(trailing_blank_runs(s.handle_mut(), chunk), whole, "chunk {chunk}");
        }
    }

    #[test]
    fn discarding_needs_consent_only_when_modified() {
        let mut s = untitled();
        let mut msgs = ScriptedMessages::default();
        assert!(s.confirm_discard(&mut msgs));
        assert!(msgs.shown.is_empty());

        type_text(&mut s, b"draft");
        let mut declined = ScriptedMessages::new([Reply::No]);
        assert!(!s.confirm_discard(&mut declined));
        assert_eq!(declined.count(Severity::Confirmation), 1);
        assert_eq!(declined.shown[0].0, "Discard unsaved changes to 'Untitled'?");

        let mut agreed = ScriptedMessages::new([Reply::Yes]);
        assert!(s.confirm_discard(&mut agreed));
    }

    #[test]
    fn before_save_leaves_clean_documents_alone() {
        let mut s = untitled();
        type_text(&mut s, b"trailing   ");
        s.handle_mut().set_save_point();
        s.before_save();
        assert_eq!(s.handle_mut().text(), b"trailing   ".to_vec());
    }

    #[test]
    fn crlf_documents_get_crlf_terminator() {
        let mut s = untitled();
        s.handle_mut().set_eol_mode(EolMode::Crlf);
        type_text(&mut s, b"x \r\ny");
        s.before_save();
        assert_eq!(s.handle_mut().text(), b"x\r\ny\r\n".to_vec());
    }

    #[test]
    fn save_untitled_goes_through_picker_and_detects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.py");
        let mut s = untitled();
        type_text(&mut s, b"print(1)");
        let mut picker = ScriptedPicker::new([path.clone()]);
        let mut msgs = ScriptedMessages::default();
        assert!(s.save_file(&mut picker, &mut msgs));
        assert_eq!(std::fs::read(&path).unwrap(), b"print(1)\n".to_vec());
        assert_eq!(s.path(), Some(path.as_path()));
        assert_eq!(s.language(), Language::Python);
        assert_eq!(s.title(), "script.py");
        assert!(msgs.shown.is_empty());
    }

    #[test]
    fn declined_overwrite_moves_on_to_next_choice() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("keep.txt");
        let fresh = dir.path().join("new.txt");
        std::fs::write(&existing, b"precious").unwrap();

        let mut s = untitled();
        type_text(&mut s, b"data\n");
        let mut picker = ScriptedPicker::new([existing.clone(), fresh.clone()]);
        let mut msgs = ScriptedMessages::new([Reply::No]);
        assert_eq!(s.save_file_with_dialog(&mut picker, &mut msgs), Some(fresh.clone()));
        assert_eq!(msgs.count(Severity::Confirmation), 1);
        assert!(msgs.shown[0].0.ends_with("already exists. Overwrite?"));
        assert_eq!(std::fs::read(&existing).unwrap(), b"precious".to_vec());
        assert_eq!(std::fs::read(&fresh).unwrap(), b"data\n".to_vec());
    }

    #[test]
    fn save_to_without_show_error_keeps_message() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("missing").join("x.txt");
        let mut s = untitled();
        let mut msgs = ScriptedMessages::default();
        assert!(!s.save_to(&bad, FileOptions::empty(), &mut msgs));
        assert!(msgs.shown.is_empty());
        let message = s.take_last_error().unwrap();
        assert!(message.contains("x.txt"), "{message}");
        assert_eq!(s.take_last_error(), None);
    }

    #[test]
    fn language_detection_fires_once() {
        struct Counting(Rc<std::cell::Cell<usize>>);
        impl LanguageDetector for Counting {
            fn detect(&self, path: &Path, head: &[u8]) -> Language {
                self.0.set(self.0.get() + 1);
                BuiltinDetector.detect(path, head)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        let calls = Rc::new(std::cell::Cell::new(0));
        let mut s = untitled();
        s.set_detector(Box::new(Counting(calls.clone())));
        type_text(&mut s, b"# title");
        let mut picker = ScriptedPicker::new([path.clone()]);
        let mut msgs = ScriptedMessages::default();
        assert!(s.save_file(&mut picker, &mut msgs));
        assert_eq!(calls.get(), 1);
        assert_eq!(s.language(), Language::Markdown);

        type_text(&mut s, b"more");
        assert!(s.save_file(&mut picker, &mut msgs));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn toggling_line_numbers_sets_margin() {
        let mut s = untitled();
        assert_eq!(s.handle_mut().line_number_width(), 0);
        s.toggle_line_numbers();
        assert_eq!(s.line_numbers(), LineNumbers::Shown);
        assert_eq!(s.handle_mut().line_number_width(), 2);
        type_text(&mut s, b"1\n2\n3\n4\n5\n6\n7\n8\n9\n10");
        s.update_line_number_width();
        assert_eq!(s.handle_mut().line_number_width(), 3);
        s.toggle_line_numbers();
        assert_eq!(s.handle_mut().line_number_width(), 0);
    }
}
