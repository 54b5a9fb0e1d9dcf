// ── Input event translation ───────────────────────────────────────────────────
//
// Converts crossterm keyboard and mouse events into the engine's vocabulary.
// Keys go through a closed table of navigation/editing keys; Ctrl+letter
// becomes the upper-case letter with CTRL set; anything else passes its
// character through.  Mouse coordinates stay in cells: the engine is
// configured so that one engine unit is one cell.

use std::{sync::OnceLock, time::Instant};

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::editor::{
    CharacterSource, Command, EditorHandle, Key, Modifiers, MouseAction, MouseInput,
};

/// Lines scrolled per mouse-wheel notch.
pub const WHEEL_LINES: isize = 3;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Monotonic milliseconds since the first call in this process.
///
/// Wraps after ~49 days; the engine compares timestamps with wrapping
/// arithmetic, so only differences matter.
pub fn now_ms() -> u32 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = *EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u32
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

/// Shift/Ctrl/Alt remap.  Other host modifiers have no engine counterpart.
pub fn translate_modifiers(modifiers: KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::empty();
    if modifiers.contains(KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    mapped
}

/// Engine key and modifiers for a key press, or `None` for keys the engine
/// has no code for (function keys, media keys, releases).
pub fn translate_key(event: &KeyEvent) -> Option<(Key, Modifiers)> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let mut modifiers = translate_modifiers(event.modifiers);
    let key = match event.code {
        KeyCode::Down => Key::Down,
        KeyCode::Up => Key::Up,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::Prior,
        KeyCode::PageDown => Key::Next,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Back,
        KeyCode::Enter => Key::Return,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            modifiers |= Modifiers::SHIFT;
            Key::Tab
        }
        // Raw control codes: ^A..^Z.
        KeyCode::Char(c @ '\u{1}'..='\u{1a}') => {
            modifiers |= Modifiers::CTRL;
            Key::Char(u32::from(c) + u32::from('A') - 1)
        }
        KeyCode::Char(c) if modifiers.contains(Modifiers::CTRL) && c.is_ascii_alphabetic() => {
            Key::Char(u32::from(c.to_ascii_uppercase()))
        }
        KeyCode::Char(c) => Key::Char(u32::from(c)),
        _ => return None,
    };
    Some((key, modifiers))
}

/// Feed a key press to the engine.  Returns whether it was consumed.
///
/// A printable key the engine declines is inserted as a typed character,
/// unless Ctrl or Alt is held.
pub fn key_down(handle: &mut EditorHandle, event: &KeyEvent) -> bool {
    let Some((key, modifiers)) = translate_key(event) else {
        return false;
    };
    if handle.send(Command::KeyDown { key, modifiers }) != 0 {
        return true;
    }
    let Key::Char(code) = key else { return false };
    if modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) {
        return false;
    }
    match char::from_u32(code).filter(|c| !c.is_control()) {
        Some(ch) => {
            handle.send(Command::InsertCharacter { ch, source: CharacterSource::Direct });
            true
        }
        None => false,
    }
}

// ── Mouse ─────────────────────────────────────────────────────────────────────

/// What a host mouse event becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseTranslation {
    Engine(MouseInput),
    /// Wheel: scroll by this many lines.
    Scroll(isize),
    Ignored,
}

/// Translate a mouse event.  `origin` is the view's top-left cell on screen.
pub fn translate_mouse(event: &MouseEvent, origin: (u16, u16), time_ms: u32) -> MouseTranslation {
    let action = match event.kind {
        MouseEventKind::Down(MouseButton::Left) => MouseAction::ButtonDown,
        MouseEventKind::Down(_) => return MouseTranslation::Ignored,
        MouseEventKind::Up(_) => MouseAction::ButtonUp,
        MouseEventKind::Drag(_) | MouseEventKind::Moved => MouseAction::Move,
        MouseEventKind::ScrollUp => return MouseTranslation::Scroll(-WHEEL_LINES),
        MouseEventKind::ScrollDown => return MouseTranslation::Scroll(WHEEL_LINES),
        MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {
            return MouseTranslation::Ignored
        }
    };
    MouseTranslation::Engine(MouseInput {
        action,
        x: i32::from(event.column) - i32::from(origin.0),
        y: i32::from(event.row) - i32::from(origin.1),
        modifiers: translate_modifiers(event.modifiers),
        time_ms,
    })
}

/// Feed a mouse event to the engine.  Returns whether it was handled.
pub fn mouse_event(handle: &mut EditorHandle, event: &MouseEvent, origin: (u16, u16)) -> bool {
    match translate_mouse(event, origin, now_ms()) {
        MouseTranslation::Engine(input) => handle.send(Command::Mouse(input)) != 0,
        MouseTranslation::Scroll(lines) => {
            handle.send(Command::LineScroll(lines));
            true
        }
        MouseTranslation::Ignored => false,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
