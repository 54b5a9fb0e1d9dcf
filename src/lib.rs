// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere: the adapter talks to the engine through
// a trait object and to the terminal through crossterm.
#![deny(unsafe_code)]

//! A code-editor widget for character-cell terminals.
//!
//! An opaque editing engine (`editor`) sits behind an `EditorHandle`.  The
//! rest of the crate adapts it to a terminal host: chunked file I/O with
//! content analysis (`storage`), key and mouse translation (`input`), a cell
//! grid drawing surface (`render`), scrollbar synchronisation (`scroll`,
//! `view`), and per-file orchestration (`file_editor`).

pub mod dialogs;
pub mod editor;
pub mod error;
pub mod file_editor;
pub mod input;
pub mod languages;
pub mod render;
pub mod scroll;
pub mod settings;
pub mod storage;
pub mod theme;
pub mod view;

pub use editor::{CharacterSource, EditorHandle, MemoryClipboard, ParentCallback};
pub use error::{EditorError, Result};
pub use file_editor::{FileEditorState, FileOptions, LineNumbers};
pub use languages::Language;
pub use settings::EditorSettings;
pub use view::EditorView;
