// ── Dialog collaborators ───────────────────────────────────────────────────────
//
// The editor never draws dialogs itself.  A host supplies a `FilePicker` (a
// callback-driven file chooser) and a `MessageBox` (modal messages with a
// fixed set of severities and buttons).  This module also holds the helpers
// dialog-driven opens need: a working-directory guard and path expansion.

use std::{
    collections::VecDeque,
    path::{Component, Path, PathBuf},
};

use tracing::warn;

use crate::error::{EditorError, Result};

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buttons {
    Ok,
    YesNo,
}

/// The button a message was dismissed with.  `Cancel` covers closing the
/// message without choosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Yes,
    No,
    Cancel,
}

pub trait MessageBox {
    fn show(&mut self, text: &str, severity: Severity, buttons: Buttons) -> Reply;
}

// ── File picker ───────────────────────────────────────────────────────────────

pub trait FilePicker {
    /// Show a picker titled `title`.  Every path the user confirms is handed
    /// to `accept`; the picker closes once `accept` returns `true`, and stays
    /// open (letting the user choose again) while it returns `false`.
    ///
    /// Returns `false` when the user cancelled.
    fn pick(&mut self, title: &str, accept: &mut dyn FnMut(&Path) -> bool) -> bool;
}

// ── Scripted collaborators ────────────────────────────────────────────────────

/// A picker that "chooses" a fixed list of paths in order, then cancels.
/// Useful for hosts without interactive dialogs, and for tests.
#[derive(Debug, Default)]
pub struct ScriptedPicker {
    paths: VecDeque<PathBuf>,
    /// Titles of every picker shown.
    pub titles: Vec<String>,
}

impl ScriptedPicker {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self { paths: paths.into_iter().map(Into::into).collect(), titles: Vec::new() }
    }
}

impl FilePicker for ScriptedPicker {
    fn pick(&mut self, title: &str, accept: &mut dyn FnMut(&Path) -> bool) -> bool {
        self.titles.push(title.to_owned());
        while let Some(path) = self.paths.pop_front() {
            if accept(&path) {
                return true;
            }
        }
        false
    }
}

/// Records every message and answers from a queue of replies.  When the
/// queue runs dry, `Ok`-only messages answer `Ok` and Yes/No ones answer `No`.
#[derive(Debug, Default)]
pub struct ScriptedMessages {
    replies: VecDeque<Reply>,
    pub shown: Vec<(String, Severity)>,
}

impl ScriptedMessages {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self { replies: replies.into_iter().collect(), shown: Vec::new() }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.shown.iter().filter(|(_, s)| *s == severity).count()
    }
}

impl MessageBox for ScriptedMessages {
    fn show(&mut self, text: &str, severity: Severity, buttons: Buttons) -> Reply {
        self.shown.push((text.to_owned(), severity));
        self.replies.pop_front().unwrap_or(match buttons {
            Buttons::Ok => Reply::Ok,
            Buttons::YesNo => Reply::No,
        })
    }
}

// ── Working-directory guard ───────────────────────────────────────────────────

/// Changes the process working directory for its lifetime.
///
/// File pickers resolve relative input against the working directory, so a
/// dialog opened "in" a directory runs under one of these.  Failures to
/// change or restore the directory are logged and otherwise ignored.
#[derive(Debug)]
pub struct CwdGuard {
    previous: Option<PathBuf>,
}

impl CwdGuard {
    /// With `dir = None` the guard does nothing.
    pub fn new(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self { previous: None };
        };
        let previous = match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(e) => {
                warn!(error = %e, "cannot read working directory");
                return Self { previous: None };
            }
        };
        if let Err(e) = std::env::set_current_dir(dir) {
            warn!(dir = %dir.display(), error = %e, "cannot change working directory");
            return Self { previous: None };
        }
        Self { previous: Some(previous) }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(e) = std::env::set_current_dir(&previous) {
                warn!(dir = %previous.display(), error = %e, "cannot restore working directory");
            }
        }
    }
}

// ── Path expansion ────────────────────────────────────────────────────────────

/// Turn user input into an absolute, lexically normalised path.
///
/// A leading `~` is replaced by `$HOME`; relative paths are resolved against
/// the current working directory; `.` and `..` components are folded.  The
/// file itself need not exist.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let invalid = |reason: &str| EditorError::PathInvalid {
        path: path.to_path_buf(),
        reason: reason.to_owned(),
    };
    if path.as_os_str().is_empty() {
        return Err(invalid("empty path"));
    }

    let mut components = path.components();
    let base = match path.components().next() {
        Some(Component::Normal(first)) if first == "~" => {
            components.next();
            let home = std::env::var_os("HOME").ok_or_else(|| invalid("HOME is not set"))?;
            PathBuf::from(home)
        }
        _ if path.is_absolute() => PathBuf::new(),
        _ => std::env::current_dir().map_err(|e| invalid(&e.to_string()))?,
    };

    let mut out = base;
    for c in components {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_picker_offers_paths_until_accepted() {
        let mut picker = ScriptedPicker::new(["a", "b", "c"]);
        let mut seen = Vec::new();
        let ok = picker.pick("Open file", &mut |p: &Path| {
            seen.push(p.to_path_buf());
            p == Path::new("b")
        });
        assert!(ok);
        assert_eq!(seen, [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(picker.titles, ["Open file"]);
        // "c" is declined, then the list is exhausted: cancelled.
        assert!(!picker.pick("again", &mut |_: &Path| false));
        assert!(!picker.pick("empty", &mut |_: &Path| true));
        assert_eq!(picker.titles.len(), 3);
    }

    #[test]
    fn scripted_messages_default_replies() {
        let mut m = ScriptedMessages::new([Reply::Yes]);
        assert_eq!(m.show("q?", Severity::Confirmation, Buttons::YesNo), Reply::Yes);
        assert_eq!(m.show("q?", Severity::Confirmation, Buttons::YesNo), Reply::No);
        assert_eq!(m.show("err", Severity::Error, Buttons::Ok), Reply::Ok);
        assert_eq!(m.count(Severity::Confirmation), 2);
        assert_eq!(m.count(Severity::Error), 1);
    }

    #[test]
    fn expand_absolute_folds_dots() {
        let p = expand_path(Path::new("/usr/./local/../bin/cat")).unwrap();
        assert_eq!(p, PathBuf::from("/usr/bin/cat"));
    }

    #[test]
    fn expand_relative_uses_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        let p = expand_path(Path::new("some/file.txt")).unwrap();
        assert_eq!(p, cwd.join("some/file.txt"));
        assert!(p.is_absolute());
    }

    #[test]
    fn expand_tilde_uses_home() {
        let Some(home) = std::env::var_os("HOME") else { return };
        let p = expand_path(Path::new("~/notes.md")).unwrap();
        assert_eq!(p, PathBuf::from(home).join("notes.md"));
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = expand_path(Path::new("")).unwrap_err();
        assert!(matches!(err, EditorError::PathInvalid { .. }), "{err}");
    }

    #[test]
    fn guard_without_directory_is_inert() {
        let before = std::env::current_dir().unwrap();
        drop(CwdGuard::new(None));
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
