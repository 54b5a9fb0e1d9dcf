// ── Editor settings ───────────────────────────────────────────────────────────
//
// Reads and writes `settings.json` from the user's config directory.
// A missing, unreadable or unrecognised file means "use the defaults"; the
// editor never refuses to start over its settings.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{IoPolicy, CHUNK_SIZE, LARGE_FILE_THRESHOLD};

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

// ── On-disk type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub version: u32,
    pub dark_mode: bool,
    /// Word wrap for newly opened documents (large files still open unwrapped).
    pub word_wrap: bool,
    /// Files above this many bytes open with word wrap disabled.
    pub large_file_threshold: u64,
    /// Cap on the engine's pre-allocation; larger files fail with "too big".
    pub allocation_limit: Option<usize>,
    /// Force line numbers on or off.  `None` lets language detection decide.
    pub line_numbers: Option<bool>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            dark_mode: false,
            word_wrap: true,
            large_file_threshold: LARGE_FILE_THRESHOLD,
            allocation_limit: None,
            line_numbers: None,
        }
    }
}

impl EditorSettings {
    pub fn io_policy(&self) -> IoPolicy {
        IoPolicy { chunk_size: CHUNK_SIZE, large_file_threshold: self.large_file_threshold }
    }
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// `$TERMSCI_CONFIG`, else `$XDG_CONFIG_HOME/termsci/settings.json`, else
/// `$HOME/.config/termsci/settings.json`.  `None` when none of them is set.
pub fn settings_path() -> Option<PathBuf> {
    resolve_path(|key| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from))
}

fn resolve_path(var: impl Fn(&str) -> Option<PathBuf>) -> Option<PathBuf> {
    if let Some(explicit) = var("TERMSCI_CONFIG") {
        return Some(explicit);
    }
    let base = var("XDG_CONFIG_HOME").or_else(|| var("HOME").map(|home| home.join(".config")))?;
    Some(base.join("termsci").join("settings.json"))
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Settings from the default location, or defaults.
pub fn load() -> EditorSettings {
    settings_path().map(|p| load_from(&p)).unwrap_or_default()
}

/// Settings from `path`, or defaults if the file is missing, unparsable or of
/// another version.
pub fn load_from(path: &Path) -> EditorSettings {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no settings file");
            return EditorSettings::default();
        }
    };
    match serde_json::from_slice::<EditorSettings>(&data) {
        Ok(s) if s.version == SETTINGS_VERSION => s,
        Ok(s) => {
            warn!(path = %path.display(), version = s.version, "unknown settings version");
            EditorSettings::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings file ignored");
            EditorSettings::default()
        }
    }
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write `settings` to the default location, creating its directory.
pub fn save(settings: &EditorSettings) -> io::Result<()> {
    let path = settings_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no config directory"))?;
    save_to(settings, &path)
}

pub fn save_to(settings: &EditorSettings, path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, settings).map_err(io::Error::other)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
