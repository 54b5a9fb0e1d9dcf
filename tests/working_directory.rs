// Changes the process working directory, so it lives in its own test binary.

use std::rc::Rc;

use termsci::{
    dialogs::{CwdGuard, ScriptedMessages, ScriptedPicker},
    editor::MemoryClipboard,
    EditorSettings, FileEditorState,
};

#[test]
fn dialog_open_resolves_relative_to_its_directory() {
    let before = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    std::fs::write(root.join("inside.md"), b"# hi\n").unwrap();

    {
        let _guard = CwdGuard::new(Some(&root));
        assert_eq!(std::env::current_dir().unwrap(), root);
    }
    assert_eq!(std::env::current_dir().unwrap(), before);

    let mut picker = ScriptedPicker::new(["inside.md"]);
    let mut msgs = ScriptedMessages::default();
    let state = FileEditorState::open_file_with_dialog(
        Some(&root),
        &EditorSettings::default(),
        Rc::new(MemoryClipboard::new()),
        &mut picker,
        &mut msgs,
    )
    .unwrap();
    assert_eq!(state.path(), Some(root.join("inside.md").as_path()));
    assert_eq!(std::env::current_dir().unwrap(), before);
    assert!(msgs.shown.is_empty(), "{:?}", msgs.shown);
}
