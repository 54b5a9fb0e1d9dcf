// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible adapter operations return `error::Result<T>`.  Errors are plain
// values: the I/O pipeline never shows UI, and nothing here terminates the
// process.  Whoever owns the `FileEditorState` decides whether a message is
// surfaced as a modal dialog or kept for inline display.

use std::path::{Path, PathBuf};

/// Every error the editor adapter can produce.
///
/// Each file-related variant carries the path it was working on and the
/// human-readable reason reported by the operating system, so the message
/// shown to the user is self-contained.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The file could not be opened (missing, permissions, is a directory, …).
    #[error("Unable to open file '{}': {reason}", path.display())]
    OpenFailed { path: PathBuf, reason: String },

    /// The engine refused to reserve room for the file's contents.
    #[error(
        "Unable to open file '{}': file too big ({requested} bytes requested)",
        path.display()
    )]
    TooBig { path: PathBuf, requested: usize },

    /// A chunk came back shorter than expected, or the read itself failed.
    #[error("Unable to read from file '{}': {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    /// Writing a chunk to the destination failed.
    #[error("Unable to write to file '{}': {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    /// A path chosen for a deferred or dialog-driven open could not be
    /// resolved to an absolute location.
    #[error("Invalid path '{}': {reason}", path.display())]
    PathInvalid { path: PathBuf, reason: String },

    /// Host-level I/O outside the file pipeline (terminal, settings file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub(crate) fn open_failed(path: &Path, e: &std::io::Error) -> Self {
        Self::OpenFailed { path: path.to_path_buf(), reason: e.to_string() }
    }

    pub(crate) fn read_failed(path: &Path, e: &std::io::Error) -> Self {
        Self::ReadFailed { path: path.to_path_buf(), reason: e.to_string() }
    }

    pub(crate) fn write_failed(path: &Path, e: &std::io::Error) -> Self {
        Self::WriteFailed { path: path.to_path_buf(), reason: e.to_string() }
    }

    /// The path this error refers to, when it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::OpenFailed { path, .. }
            | Self::TooBig { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::WriteFailed { path, .. }
            | Self::PathInvalid { path, .. } => Some(path),
            Self::Io(_) => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EditorError>;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_failed_embeds_path_and_reason() {
        let e = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err = EditorError::open_failed(Path::new("/no/such/file"), &e);
        let msg = err.to_string();
        assert!(msg.contains("/no/such/file"), "{msg}");
        assert!(msg.contains("No such file or directory"), "{msg}");
    }

    #[test]
    fn too_big_reports_requested_size() {
        let err = EditorError::TooBig { path: PathBuf::from("big.log"), requested: 4096 };
        assert_eq!(
            err.to_string(),
            "Unable to open file 'big.log': file too big (4096 bytes requested)"
        );
        assert_eq!(err.path(), Some(Path::new("big.log")));
    }

    #[test]
    fn io_variant_has_no_path() {
        let err = EditorError::from(std::io::Error::other("tty gone"));
        assert!(err.path().is_none());
        assert_eq!(err.to_string(), "I/O error: tty gone");
    }
}
