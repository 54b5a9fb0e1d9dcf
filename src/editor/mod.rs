// ── Editor component abstraction ──────────────────────────────────────────────
//
// Exposes a safe, typed API over an opaque editing engine.  Callers hold an
// `EditorHandle` and talk to the engine only through `Command`s; they never
// see the engine's internals.  `PlainEngine` is the built-in engine.

pub mod engine;
pub mod handle;
pub mod messages;
pub mod plain;

pub use engine::{
    Clipboard, Engine, EngineHost, MemoryClipboard, OutOfMemory, ParentCallback, RunStyle, Surface,
};
pub use handle::{EditorHandle, EngineProfile, CELL_PROFILE};
pub use messages::{
    CaretStyle, CharacterSource, CodePage, Command, EngineColor, EolMode, Key, Modifiers,
    MouseAction, MouseInput, Notification, PRect, WrapMode, STYLE_COUNT, STYLE_DEFAULT,
    STYLE_LINENUMBER, STYLE_TEXT,
};
pub use plain::PlainEngine;
