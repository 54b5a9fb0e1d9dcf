// End-to-end load/save scenarios against real files.

use std::{cell::RefCell, path::Path, rc::Rc};

use pretty_assertions::assert_eq;
use termsci::{
    dialogs::{ScriptedMessages, ScriptedPicker, Severity},
    editor::{Command, Engine, EngineHost, MemoryClipboard, OutOfMemory, PlainEngine},
    storage::{self, IoPolicy, ALLOCATION_SLACK, CHUNK_SIZE},
    EditorError, EditorHandle, EditorSettings, FileEditorState, FileOptions,
};

/// Wraps the built-in engine and records the size of every append.
struct RecordingEngine {
    inner: PlainEngine,
    appends: Rc<RefCell<Vec<usize>>>,
}

impl Engine for RecordingEngine {
    fn dispatch(&mut self, cmd: Command<'_>, host: &mut dyn EngineHost) -> Result<isize, OutOfMemory> {
        if let Command::AppendText(text) = &cmd {
            self.appends.borrow_mut().push(text.len());
        }
        self.inner.dispatch(cmd, host)
    }
}

fn recording(inner: PlainEngine) -> (EditorHandle, Rc<RefCell<Vec<usize>>>) {
    let appends = Rc::new(RefCell::new(Vec::new()));
    let engine = RecordingEngine { inner, appends: appends.clone() };
    (EditorHandle::with_engine(Box::new(engine), Rc::new(MemoryClipboard::new())), appends)
}

fn handle() -> EditorHandle {
    EditorHandle::create(Rc::new(MemoryClipboard::new()))
}

#[test]
fn unedited_document_round_trips_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("mixed.txt");
    let dst = dir.path().join("copy.txt");
    let bytes: Vec<u8> = b"tabs\there  \r\nlf only\nlone cr\rend without newline   ".to_vec();
    std::fs::write(&src, &bytes).unwrap();

    let mut h = handle();
    let policy = IoPolicy { chunk_size: 7, ..IoPolicy::default() };
    storage::load(&mut h, &src, &policy).unwrap();
    storage::save(&mut h, &dst, &policy).unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), bytes);
}

#[test]
fn clean_file_editor_save_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clean.txt");
    let bytes = b"keep my trailing spaces   \nand no final newline".to_vec();
    std::fs::write(&path, &bytes).unwrap();

    let settings = EditorSettings::default();
    let mut msgs = ScriptedMessages::default();
    let mut state = FileEditorState::open_file(
        &path,
        &settings,
        Rc::new(MemoryClipboard::new()),
        FileOptions::SHOW_ERROR,
        &mut msgs,
    )
    .unwrap();
    assert!(state.save_file(&mut ScriptedPicker::default(), &mut msgs));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    assert!(msgs.shown.is_empty());
}

#[test]
fn too_big_reads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.txt");
    std::fs::write(&path, vec![b'x'; 100]).unwrap();

    let (mut h, appends) = recording(PlainEngine::new().with_allocation_limit(500));
    let err = storage::load(&mut h, &path, &IoPolicy::default()).unwrap_err();
    match &err {
        EditorError::TooBig { path: p, requested } => {
            assert_eq!(p, &path);
            assert_eq!(*requested, 100 + ALLOCATION_SLACK);
        }
        other => panic!("expected TooBig, got {other:?}"),
    }
    assert!(err.to_string().contains("file too big"));
    assert!(appends.borrow().is_empty());
    assert!(h.is_empty());
}

#[test]
fn allocation_limit_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.txt");
    std::fs::write(&path, vec![b'x'; 100]).unwrap();

    let settings = EditorSettings { allocation_limit: Some(10), ..EditorSettings::default() };
    let mut msgs = ScriptedMessages::default();
    let err = FileEditorState::open_file(
        &path,
        &settings,
        Rc::new(MemoryClipboard::new()),
        FileOptions::SHOW_ERROR,
        &mut msgs,
    )
    .unwrap_err();
    assert!(matches!(err, EditorError::TooBig { .. }));
    assert_eq!(msgs.count(Severity::Error), 1);
}

#[test]
fn empty_file_keeps_word_wrap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, b"").unwrap();

    let mut h = handle();
    let report = storage::load(&mut h, &path, &IoPolicy::default()).unwrap();
    assert_eq!(report.bytes, 0);
    assert_eq!(report.chunks, 0);
    assert!(!report.large_file);
    assert!(h.is_empty());
    assert!(h.is_word_wrap());
    assert!(!h.is_modified());
}

#[test]
fn two_mebibyte_file_disables_wrap_and_streams_in_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("large.log");
    let line = b"0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcde\n";
    let bytes: Vec<u8> = line.iter().copied().cycle().take(2 * 1024 * 1024).collect();
    std::fs::write(&path, &bytes).unwrap();

    let (mut h, appends) = recording(PlainEngine::new());
    let report = storage::load(&mut h, &path, &IoPolicy::default()).unwrap();
    assert!(report.large_file);
    assert!(!h.is_word_wrap());
    assert_eq!(report.chunks, bytes.len().div_ceil(CHUNK_SIZE));

    let appends = appends.borrow();
    assert_eq!(appends.len(), report.chunks);
    assert!(appends.iter().all(|&n| n <= CHUNK_SIZE));
    assert_eq!(appends.iter().sum::<usize>(), bytes.len());
    assert!(h.text() == bytes, "content differs");
}

#[test]
fn missing_file_is_open_failed_with_path() {
    let mut h = handle();
    let err = storage::load(&mut h, Path::new("/no/such/file"), &IoPolicy::default()).unwrap_err();
    assert!(matches!(err, EditorError::OpenFailed { .. }), "{err:?}");
    assert!(err.to_string().contains("'/no/such/file'"), "{err}");
    assert_eq!(err.path(), Some(Path::new("/no/such/file")));
}
