// ── Chunked file I/O ──────────────────────────────────────────────────────────
//
// Load and save move document bytes through one fixed-size buffer per thread,
// so peak memory stays bounded no matter how large the file is.  Both run to
// completion on the calling thread; chunking bounds memory, not latency.
// Errors come back as values and never show UI.

pub mod properties;

use std::{
    cell::Cell,
    fs::File,
    io::{Read, Write},
    ops::{Deref, DerefMut},
    path::Path,
};

use tracing::{debug, info};

use crate::{
    editor::{Command, EditorHandle},
    error::{EditorError, Result},
};
pub use properties::{Conclusions, DocumentProperties, DEFAULT_INDENT};

// ── Policy constants ──────────────────────────────────────────────────────────

/// Size of the reusable I/O buffer and the default chunk length.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Files larger than this open with word-wrap disabled.
pub const LARGE_FILE_THRESHOLD: u64 = 1024 * 1024;

/// Extra storage reserved beyond the file size: a file about to be edited
/// usually grows before it is saved.
pub const ALLOCATION_SLACK: usize = 1000;

/// Tunables for a load or save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoPolicy {
    /// Bytes moved per iteration; clamped to `1..=CHUNK_SIZE`.
    pub chunk_size: usize,
    pub large_file_threshold: u64,
}

impl Default for IoPolicy {
    fn default() -> Self {
        Self { chunk_size: CHUNK_SIZE, large_file_threshold: LARGE_FILE_THRESHOLD }
    }
}

impl IoPolicy {
    fn chunk(&self) -> usize {
        self.chunk_size.clamp(1, CHUNK_SIZE)
    }
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub bytes: usize,
    pub chunks: usize,
    /// Word-wrap was switched off because the file exceeded the threshold.
    pub large_file: bool,
    pub properties: Conclusions,
}

// ── Thread-local buffer ───────────────────────────────────────────────────────

thread_local! {
    static BUFFER: Cell<Option<Box<[u8]>>> = const { Cell::new(None) };
}

/// Exclusive use of this thread's I/O buffer until dropped.
struct BufferLease {
    buf: Option<Box<[u8]>>,
}

impl BufferLease {
    fn acquire() -> Self {
        let buf = BUFFER
            .with(Cell::take)
            .unwrap_or_else(|| vec![0; CHUNK_SIZE].into_boxed_slice());
        Self { buf: Some(buf) }
    }
}

impl Deref for BufferLease {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl DerefMut for BufferLease {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            BUFFER.with(|slot| slot.set(Some(buf)));
        }
    }
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read `path` into `handle`, which should be empty.
///
/// Storage for the whole file (plus slack) is reserved before anything is
/// read; if the engine refuses, `TooBig` is returned and the file is never
/// read.  Every chunk is appended to the engine and fed to the properties
/// analyzer, which is applied once the last chunk is in.
pub fn load(handle: &mut EditorHandle, path: &Path, policy: &IoPolicy) -> Result<LoadReport> {
    let mut file = File::open(path).map_err(|e| EditorError::open_failed(path, &e))?;
    let size = file.metadata().map_err(|e| EditorError::open_failed(path, &e))?.len();
    let size = usize::try_from(size)
        .map_err(|_| EditorError::TooBig { path: path.to_path_buf(), requested: usize::MAX })?;
    debug!(path = %path.display(), size, "load started");

    let too_big = |requested| EditorError::TooBig { path: path.to_path_buf(), requested };
    handle
        .dispatch(Command::Allocate(size.saturating_add(ALLOCATION_SLACK)))
        .map_err(|oom| too_big(oom.requested))?;

    // Only once the allocation succeeded, so a refused load changes nothing.
    let large_file = size as u64 > policy.large_file_threshold;
    if large_file {
        info!(path = %path.display(), size, "large file: word wrap disabled");
        handle.set_word_wrap(false);
    }

    let mut lease = BufferLease::acquire();
    let chunk = policy.chunk();
    let mut props = DocumentProperties::new();
    let mut remaining = size;
    let mut chunks = 0;
    while remaining > 0 {
        let n = chunk.min(remaining);
        let buf = &mut lease[..n];
        file.read_exact(buf).map_err(|e| EditorError::read_failed(path, &e))?;
        handle.dispatch(Command::AppendText(buf)).map_err(|oom| too_big(oom.requested))?;
        props.analyze(buf);
        remaining -= n;
        chunks += 1;
    }
    drop(lease);

    let properties = props.apply(handle);
    handle.set_save_point();
    info!(path = %path.display(), bytes = size, chunks, "file loaded");
    Ok(LoadReport { bytes: size, chunks, large_file, properties })
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write the whole document to `path`, truncating it.  Returns bytes written.
pub fn save(handle: &mut EditorHandle, path: &Path, policy: &IoPolicy) -> Result<usize> {
    let mut file = File::create(path).map_err(|e| EditorError::open_failed(path, &e))?;
    let len = handle.len();
    debug!(path = %path.display(), len, "save started");

    let mut lease = BufferLease::acquire();
    let chunk = policy.chunk();
    let mut offset = 0;
    while offset < len {
        let want = chunk.min(len - offset);
        let n = handle.text_range(offset, &mut lease[..want]);
        if n == 0 {
            break;
        }
        file.write_all(&lease[..n]).map_err(|e| EditorError::write_failed(path, &e))?;
        offset += n;
    }
    file.flush().map_err(|e| EditorError::write_failed(path, &e))?;
    info!(path = %path.display(), bytes = offset, "file saved");
    Ok(offset)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::editor::{EolMode, MemoryClipboard, PlainEngine};

    fn handle() -> EditorHandle {
        EditorHandle::create(Rc::new(MemoryClipboard::new()))
    }

    #[test]
    fn buffer_is_reused_across_leases() {
        let first = BufferLease::acquire();
        let ptr = first.as_ptr();
        drop(first);
        let second = BufferLease::acquire();
        assert_eq!(second.as_ptr(), ptr);
        assert_eq!(second.len(), CHUNK_SIZE);
    }

    #[test]
    fn nested_lease_gets_its_own_buffer() {
        let outer = BufferLease::acquire();
        let inner = BufferLease::acquire();
        assert_ne!(outer.as_ptr(), inner.as_ptr());
    }

    #[test]
    fn load_reads_content_and_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"one\r\n  two\r\n").unwrap();

        let mut h = handle();
        let policy = IoPolicy { chunk_size: 4, ..IoPolicy::default() };
        let report = load(&mut h, &path, &policy).unwrap();
        assert_eq!(h.text(), b"one\r\n  two\r\n".to_vec());
        assert_eq!(report.bytes, 12);
        assert_eq!(report.chunks, 3);
        assert!(!report.large_file);
        assert_eq!(h.eol_mode(), EolMode::Crlf);
        assert_eq!(h.send(Command::GetIndent), 2);
        assert!(!h.is_modified());
    }

    #[test]
    fn small_threshold_disables_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut h = handle();
        let policy = IoPolicy { large_file_threshold: 9, ..IoPolicy::default() };
        let report = load(&mut h, &path, &policy).unwrap();
        assert!(report.large_file);
        assert!(!h.is_word_wrap());
    }

    #[test]
    fn refused_large_file_keeps_wrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let engine = PlainEngine::new().with_allocation_limit(8);
        let mut h = EditorHandle::with_engine(Box::new(engine), Rc::new(MemoryClipboard::new()));
        assert!(h.is_word_wrap());
        let policy = IoPolicy { large_file_threshold: 9, ..IoPolicy::default() };
        let err = load(&mut h, &path, &policy).unwrap_err();
        assert!(matches!(err, EditorError::TooBig { .. }));
        assert!(h.is_word_wrap());
        assert!(h.is_empty());
    }

    #[test]
    fn save_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut h = handle();
        h.dispatch(Command::AppendText(b"abcdefghij")).unwrap();
        let policy = IoPolicy { chunk_size: 3, ..IoPolicy::default() };
        assert_eq!(save(&mut h, &path, &policy).unwrap(), 10);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdefghij".to_vec());
    }

    #[test]
    fn save_into_missing_directory_is_open_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        let mut h = handle();
        let err = save(&mut h, &path, &IoPolicy::default()).unwrap_err();
        assert!(matches!(err, EditorError::OpenFailed { .. }), "{err}");
    }
}
