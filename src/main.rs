// ── Safety policy ────────────────────────────────────────────────────────────
#![deny(unsafe_code)]

// Terminal host: opens one file, renders it through the cell grid, forwards
// keys and mouse to the engine, and drives idle work from the event loop.
//
//   termsci [PATH]
//
// Ctrl+S save · Ctrl+O open · Ctrl+L line numbers · Ctrl+W wrap ·
// Ctrl+T theme · Ctrl+Q quit.  Set TERMSCI_LOG (an EnvFilter directive) to
// log into TERMSCI_LOG_FILE, or termsci.log in the temp directory.

use std::{
    cell::RefCell,
    fs::File,
    io::{self, Stdout, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    sync::{Mutex, Once},
    time::Duration,
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute, queue,
    style::{Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use termsci::{
    dialogs::{Buttons, FilePicker, MessageBox, Reply, Severity},
    editor::{Clipboard, Command, MemoryClipboard, PRect},
    input,
    render::{self, Cell, CellGrid, ColorAttr, Rect},
    settings, theme, EditorSettings, EditorView, FileEditorState, FileOptions,
};

// ── Logging ───────────────────────────────────────────────────────────────────

/// Log to a file, never to the terminal the editor occupies.  Off unless
/// `TERMSCI_LOG` is set.
fn init_logging() {
    let Ok(directive) = std::env::var("TERMSCI_LOG") else { return };
    let path = std::env::var_os("TERMSCI_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("termsci.log"));
    let Ok(file) = File::create(&path) else { return };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ── Terminal guard ────────────────────────────────────────────────────────────

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, Hide)?;
        Ok(Self)
    }
}

fn restore_terminal() {
    let _ = execute!(io::stdout(), Show, DisableMouseCapture, LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            tracing::error!(?info, "panic");
            default_panic(info);
        }));
    });
}

// ── Status-line collaborators ─────────────────────────────────────────────────

fn draw_status(text: &str) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let attr = theme::LIGHT.line_numbers;
    let line: String = format!(" {text}").chars().chain(std::iter::repeat(' ')).take(usize::from(width)).collect();
    let mut out = io::stdout();
    queue!(
        out,
        MoveTo(0, height.saturating_sub(1)),
        SetForegroundColor(attr.fg),
        SetBackgroundColor(attr.bg),
        Print(line),
        ResetColor
    )?;
    out.flush()
}

fn next_key() -> Option<KeyEvent> {
    loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => return Some(key),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "event read failed");
                return None;
            }
        }
    }
}

/// A one-line path prompt on the status row.
struct PromptPicker;

impl PromptPicker {
    fn read_line(prompt: &str) -> Option<String> {
        let mut text = String::new();
        loop {
            draw_status(&format!("{prompt}: {text}")).ok()?;
            let key = next_key()?;
            match key.code {
                KeyCode::Enter => return Some(text),
                KeyCode::Esc => return None,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => text.push(c),
                _ => {}
            }
        }
    }
}

impl FilePicker for PromptPicker {
    fn pick(&mut self, title: &str, accept: &mut dyn FnMut(&Path) -> bool) -> bool {
        while let Some(line) = Self::read_line(title) {
            if accept(Path::new(line.trim())) {
                return true;
            }
        }
        false
    }
}

/// Messages on the status row, answered with a key press.
struct StatusMessages;

impl MessageBox for StatusMessages {
    fn show(&mut self, text: &str, severity: Severity, buttons: Buttons) -> Reply {
        let prefix = match severity {
            Severity::Error => "Error: ",
            Severity::Warning => "Warning: ",
            Severity::Information | Severity::Confirmation => "",
        };
        let hint = match buttons {
            Buttons::Ok => "(press a key)",
            Buttons::YesNo => "[y/n]",
        };
        if draw_status(&format!("{prefix}{text} {hint}")).is_err() {
            return Reply::Cancel;
        }
        loop {
            let Some(key) = next_key() else { return Reply::Cancel };
            match (buttons, key.code) {
                (Buttons::Ok, _) => return Reply::Ok,
                (Buttons::YesNo, KeyCode::Char('y' | 'Y')) => return Reply::Yes,
                (Buttons::YesNo, KeyCode::Char('n' | 'N')) => return Reply::No,
                (Buttons::YesNo, KeyCode::Esc) => return Reply::Cancel,
                _ => {}
            }
        }
    }
}

// ── Screen ────────────────────────────────────────────────────────────────────

/// The editor view (everything but the last column and row), a scrollbar
/// column, and a status row.
struct Screen {
    grid: CellGrid,
    view: Rc<RefCell<EditorView>>,
    out: Stdout,
}

impl Screen {
    fn new(width: u16, height: u16) -> Self {
        let (vw, vh) = Self::view_size(width, height);
        Self {
            grid: CellGrid::new(width, height),
            view: Rc::new(RefCell::new(EditorView::new(vw, vh))),
            out: io::stdout(),
        }
    }

    fn view_size(width: u16, height: u16) -> (u16, u16) {
        (width.saturating_sub(1), height.saturating_sub(1))
    }

    fn view_rect(&self) -> Rect {
        let (w, h) = self.view.borrow().size();
        Rect::new(0, 0, w, h)
    }

    fn resize(&mut self, width: u16, height: u16) {
        let (vw, vh) = Self::view_size(width, height);
        self.grid.resize(width, height);
        self.view.borrow_mut().resize(vw, vh);
    }

    fn attach(&self, state: &mut FileEditorState) {
        let handle = state.handle_mut();
        handle.attach(&self.view);
        handle.size_changed();
    }

    fn draw(&mut self, state: &mut FileEditorState, force: bool) -> io::Result<()> {
        let pending = self.view.borrow_mut().take_invalidated();
        if pending.is_none() && !force {
            return Ok(());
        }
        let rect = self.view_rect();
        let area = PRect::new(0.0, 0.0, f64::from(rect.width), f64::from(rect.height));
        render::paint(state.handle_mut(), &mut self.grid, rect, area);
        self.draw_scrollbar(rect, state.is_dark_mode());
        self.draw_status_row(state);
        self.grid.flush(&mut self.out, self.grid.bounds())?;
        self.out.flush()
    }

    fn draw_scrollbar(&mut self, rect: Rect, dark: bool) {
        let bar = self.view.borrow().vertical();
        let track = usize::from(rect.height);
        let (pos, len) = bar.thumb(track);
        let attr = theme::palette(dark).line_numbers;
        for row in 0..rect.height {
            let r = usize::from(row);
            let ch = if r >= pos && r < pos + len { '█' } else { '│' };
            self.grid.set(rect.right(), row, Cell { ch, fg: attr.fg, bg: attr.bg, bold: false });
        }
    }

    fn draw_status_row(&mut self, state: &mut FileEditorState) {
        let title = state.title();
        let language = state.language().display_name();
        let handle = state.handle_mut();
        let eol = handle.eol_mode().as_str();
        let pos = handle.send(Command::GetCurrentPos).max(0) as usize;
        let line = handle.send(Command::LineFromPosition(pos)) + 1;
        let col = handle.send(Command::GetColumn(pos)) + 1;
        let text = format!(" {title}  |  {language}  |  {eol}  |  Ln {line}, Col {col}");

        let row = self.grid.height().saturating_sub(1);
        let ColorAttr { fg, bg } = theme::palette(state.is_dark_mode()).line_numbers;
        self.grid.fill(Rect::new(0, row, self.grid.width(), 1), bg);
        self.grid.put_str(0, row, self.grid.width(), &text, fg, bg, false);
    }
}

// ── Shortcuts ─────────────────────────────────────────────────────────────────

enum Shortcut {
    Quit,
    Save,
    Open,
    LineNumbers,
    Wrap,
    Theme,
}

fn shortcut(key: &KeyEvent) -> Option<Shortcut> {
    if !key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(Shortcut::Quit),
        KeyCode::Char('s') => Some(Shortcut::Save),
        KeyCode::Char('o') => Some(Shortcut::Open),
        KeyCode::Char('l') => Some(Shortcut::LineNumbers),
        KeyCode::Char('w') => Some(Shortcut::Wrap),
        KeyCode::Char('t') => Some(Shortcut::Theme),
        _ => None,
    }
}

// ── Main loop ─────────────────────────────────────────────────────────────────

fn run() -> termsci::Result<()> {
    let mut settings: EditorSettings = settings::load();
    let clipboard: Rc<dyn Clipboard> = Rc::new(MemoryClipboard::new());
    let path = std::env::args_os().nth(1).map(PathBuf::from);

    let _terminal = TerminalGuard::enter()?;
    let mut picker = PromptPicker;
    let mut messages = StatusMessages;

    let mut state = path
        .and_then(|p| {
            FileEditorState::open_file(&p, &settings, clipboard.clone(), FileOptions::SHOW_ERROR, &mut messages)
                .ok()
        })
        .unwrap_or_else(|| FileEditorState::new_untitled(&settings, clipboard.clone()));

    let (width, height) = terminal::size()?;
    let mut screen = Screen::new(width, height);
    screen.attach(&mut state);
    info!(width, height, "editor started");

    let mut force = true;
    loop {
        screen.draw(&mut state, force)?;
        force = false;

        let busy = state.handle_mut().idle_work(input::now_ms());
        let timeout = Duration::from_millis(if busy { 50 } else { 500 });
        if !event::poll(timeout)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => match shortcut(&key) {
                Some(Shortcut::Quit) => {
                    if state.confirm_discard(&mut messages) {
                        break;
                    }
                    force = true;
                }
                Some(Shortcut::Save) => {
                    state.save_file(&mut picker, &mut messages);
                    force = true;
                }
                Some(Shortcut::Open) => {
                    if !state.confirm_discard(&mut messages) {
                        force = true;
                        continue;
                    }
                    if let Some(opened) = FileEditorState::open_file_with_dialog(
                        None,
                        &settings,
                        clipboard.clone(),
                        &mut picker,
                        &mut messages,
                    ) {
                        state = opened;
                        screen.attach(&mut state);
                    }
                    force = true;
                }
                Some(Shortcut::LineNumbers) => state.toggle_line_numbers(),
                Some(Shortcut::Wrap) => {
                    let wrap = !state.handle_mut().is_word_wrap();
                    state.set_word_wrap(wrap);
                }
                Some(Shortcut::Theme) => {
                    settings.dark_mode = !settings.dark_mode;
                    state.set_dark_mode(settings.dark_mode);
                    if let Err(e) = settings::save(&settings) {
                        warn!(error = %e, "settings not saved");
                    }
                    force = true;
                }
                None => {
                    input::key_down(state.handle_mut(), &key);
                    force = true;
                }
            },
            Event::Mouse(mouse) => {
                input::mouse_event(state.handle_mut(), &mouse, (0, 0));
                force = true;
            }
            Event::Resize(w, h) => {
                screen.resize(w, h);
                state.handle_mut().size_changed();
                force = true;
            }
            _ => {}
        }
        state.update_line_number_width();
    }
    info!("editor closed");
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    install_panic_hook();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            restore_terminal();
            eprintln!("termsci: {e}");
            ExitCode::FAILURE
        }
    }
}
