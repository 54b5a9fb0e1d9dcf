// FileEditorState scenarios: dialog-driven save, normalisation, language
// detection.

use std::{cell::Cell, path::Path, rc::Rc};

use pretty_assertions::assert_eq;
use termsci::{
    dialogs::{Reply, ScriptedMessages, ScriptedPicker, Severity},
    editor::{Command, MemoryClipboard},
    languages::{BuiltinDetector, LanguageDetector},
    EditorSettings, FileEditorState, FileOptions, Language, LineNumbers,
};

fn untitled() -> FileEditorState {
    FileEditorState::new_untitled(&EditorSettings::default(), Rc::new(MemoryClipboard::new()))
}

fn append(state: &mut FileEditorState, text: &[u8]) {
    let h = state.handle_mut();
    let end = h.len();
    h.send(Command::GotoPos(end));
    h.insert_paste_stream(text).unwrap();
}

#[test]
fn declined_overwrite_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("existing.txt");
    std::fs::write(&target, b"original\n").unwrap();

    let mut state = untitled();
    append(&mut state, b"replacement\n");
    let mut picker = ScriptedPicker::new([target.clone()]);
    let mut msgs = ScriptedMessages::new([Reply::No]);

    assert!(!state.save_file(&mut picker, &mut msgs));
    assert_eq!(msgs.count(Severity::Confirmation), 1);
    assert_eq!(std::fs::read(&target).unwrap(), b"original\n".to_vec());
    assert_eq!(state.path(), None);
    assert!(state.handle_mut().is_modified());
}

#[test]
fn confirmed_overwrite_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("existing.txt");
    std::fs::write(&target, b"original\n").unwrap();

    let mut state = untitled();
    append(&mut state, b"replacement");
    let mut picker = ScriptedPicker::new([target.clone()]);
    let mut msgs = ScriptedMessages::new([Reply::Yes]);

    assert!(state.save_file(&mut picker, &mut msgs));
    assert_eq!(msgs.count(Severity::Confirmation), 1);
    assert_eq!(std::fs::read(&target).unwrap(), b"replacement\n".to_vec());
    assert_eq!(state.path(), Some(target.as_path()));
    assert!(!state.handle_mut().is_modified());
}

#[test]
fn before_save_is_idempotent() {
    let mut state = untitled();
    append(&mut state, b"  lead stays\ntrail goes \t \n\n  \nlast");
    state.before_save();
    let once = state.handle_mut().text();
    state.before_save();
    assert_eq!(state.handle_mut().text(), once);
    assert_eq!(once, b"  lead stays\ntrail goes\n\n\nlast\n".to_vec());
}

struct Counting {
    calls: Rc<Cell<usize>>,
}

impl LanguageDetector for Counting {
    fn detect(&self, path: &Path, head: &[u8]) -> Language {
        self.calls.set(self.calls.get() + 1);
        BuiltinDetector.detect(path, head)
    }
}

#[test]
fn detection_turns_on_line_numbers_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build");
    let calls = Rc::new(Cell::new(0));

    let mut state = untitled();
    state.set_detector(Box::new(Counting { calls: calls.clone() }));
    append(&mut state, b"#!/bin/sh\necho hi");
    let mut picker = ScriptedPicker::new([path.clone()]);
    let mut msgs = ScriptedMessages::default();

    assert!(state.save_file(&mut picker, &mut msgs));
    assert_eq!(state.language(), Language::Shell);
    assert_eq!(state.line_numbers(), LineNumbers::Shown);
    assert_eq!(calls.get(), 1);

    // The user hides them; later saves neither re-detect nor override that.
    state.toggle_line_numbers();
    append(&mut state, b"echo again\n");
    assert!(state.save_file(&mut picker, &mut msgs));
    assert_eq!(calls.get(), 1);
    assert_eq!(state.line_numbers(), LineNumbers::Hidden);
}

#[test]
fn unknown_language_keeps_detecting_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let calls = Rc::new(Cell::new(0));

    let mut state = untitled();
    state.set_detector(Box::new(Counting { calls: calls.clone() }));
    append(&mut state, b"plain");
    let mut picker = ScriptedPicker::new([path]);
    let mut msgs = ScriptedMessages::default();
    assert!(state.save_file(&mut picker, &mut msgs));
    append(&mut state, b" more");
    assert!(state.save_file(&mut picker, &mut msgs));

    assert_eq!(calls.get(), 2);
    assert_eq!(state.language(), Language::None);
    assert_eq!(state.line_numbers(), LineNumbers::Default);
}

#[test]
fn open_with_dialog_retries_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.toml");
    std::fs::write(&good, b"[package]\n").unwrap();

    let mut picker = ScriptedPicker::new([dir.path().join("absent.toml"), good.clone()]);
    let mut msgs = ScriptedMessages::default();
    let state = FileEditorState::open_file_with_dialog(
        None,
        &EditorSettings::default(),
        Rc::new(MemoryClipboard::new()),
        &mut picker,
        &mut msgs,
    )
    .unwrap();
    assert_eq!(state.path(), Some(good.as_path()));
    assert_eq!(state.language(), Language::Toml);
    assert_eq!(msgs.count(Severity::Error), 1);
    assert!(msgs.shown[0].0.contains("absent.toml"));
}

#[test]
fn cancelled_open_returns_nothing() {
    let mut msgs = ScriptedMessages::default();
    let opened = FileEditorState::open_file_with_dialog(
        None,
        &EditorSettings::default(),
        Rc::new(MemoryClipboard::new()),
        &mut ScriptedPicker::default(),
        &mut msgs,
    );
    assert!(opened.is_none());
    assert!(msgs.shown.is_empty());
}

#[test]
fn quiet_open_failure_shows_nothing() {
    let mut msgs = ScriptedMessages::default();
    let result = FileEditorState::open_file(
        Path::new("/no/such/file"),
        &EditorSettings::default(),
        Rc::new(MemoryClipboard::new()),
        FileOptions::empty(),
        &mut msgs,
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("/no/such/file"));
    assert!(msgs.shown.is_empty());
}
