//! The browsing session: one root directory, at most one open file.
//!
//! `Session` is the explicit handle that owns all shared mutable state — the
//! configured root, the current [`RangeStore`], and the extension filter —
//! each behind a readers-writer lock. Any number of range reads, exports, and
//! searches proceed in parallel under the read lock; opening a file, closing
//! it, or changing the root takes the write lock, waits out in-flight reads,
//! and drops the previous store before installing its replacement. At most one
//! store is ever live per session.
//!
//! Paths are resolved against the canonicalized root and refused when they
//! escape it (directly or through symlinks).

use crate::browse::{self, ExtensionFilter, FilterMode};
use crate::error::{BiglogError, Result};
use crate::store::RangeStore;
use bstr::BString;
use parking_lot::RwLock;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A single browsing session over a root directory.
#[derive(Debug)]
pub struct Session {
    root: RwLock<PathBuf>,
    current: RwLock<Option<RangeStore>>,
    filter: RwLock<ExtensionFilter>,
}

impl Session {
    /// Create a session rooted at `root`, creating the directory if missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .map_err(|e| BiglogError::io(format!("Failed to create root: {}", root.display()), e))?;
        let root = root
            .canonicalize()
            .map_err(|e| BiglogError::io(format!("Failed to resolve root: {}", root.display()), e))?;

        Ok(Self {
            root: RwLock::new(root),
            current: RwLock::new(None),
            filter: RwLock::new(ExtensionFilter::new()),
        })
    }

    /// The current root directory.
    pub fn root(&self) -> PathBuf {
        self.root.read().clone()
    }

    /// Point the session at a new root directory.
    ///
    /// The directory must already exist. Closes the current file: a store
    /// opened under the old root must not outlive it.
    pub fn set_root(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BiglogError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => BiglogError::io(format!("Failed to stat root: {}", path.display()), e),
        })?;
        if !metadata.is_dir() {
            return Err(BiglogError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        let canonical = path
            .canonicalize()
            .map_err(|e| BiglogError::io(format!("Failed to resolve root: {}", path.display()), e))?;

        let mut root = self.root.write();
        self.current.write().take();
        *root = canonical.clone();
        log::info!("root changed to {}", canonical.display());
        Ok(canonical)
    }

    /// Open `path` (relative to the root, or absolute but still inside it),
    /// build its line index, and install it as the current file.
    ///
    /// Replaces and closes any previously open store. Returns the line count.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<u64> {
        let resolved = self.resolve(path.as_ref())?;
        let store = RangeStore::open(&resolved)?;
        let lines = store.line_count();

        // The swap is the only exclusive step; index construction above runs
        // without blocking in-flight readers of the old store.
        *self.current.write() = Some(store);
        log::info!("opened {} ({} lines)", resolved.display(), lines);
        Ok(lines)
    }

    /// Close the current file, releasing its handle. Safe to call when none
    /// is open.
    pub fn close(&self) {
        self.current.write().take();
    }

    /// Line count of the current file, if one is open.
    pub fn line_count(&self) -> Option<u64> {
        self.current.read().as_ref().map(RangeStore::line_count)
    }

    /// Materialize lines `[start, start + count)` of the current file,
    /// byte-for-byte.
    pub fn read_range(&self, start: u64, count: u64) -> Result<Vec<BString>> {
        let guard = self.current.read();
        let store = guard.as_ref().ok_or(BiglogError::NoFileOpen)?;
        store.read_lines(start, count)
    }

    /// Stream lines `[start, end)` of the current file to `sink`.
    pub fn write_range(&self, sink: &mut dyn Write, start: u64, end: u64) -> Result<()> {
        let guard = self.current.read();
        let store = guard.as_ref().ok_or(BiglogError::NoFileOpen)?;
        store.write_range(sink, start, end)
    }

    /// Case-insensitive substring search over the current file.
    pub fn search(&self, needle: &str, limit: usize) -> Result<Vec<u64>> {
        let guard = self.current.read();
        let store = guard.as_ref().ok_or(BiglogError::NoFileOpen)?;
        store.search(needle, limit)
    }

    /// List browsable files under the root, per the active extension filter.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let root = self.root();
        let filter = self.filter.read();
        browse::list_files(&root, &filter)
    }

    /// Current extension filter entries, sorted.
    pub fn extensions(&self) -> Vec<String> {
        self.filter.read().extensions()
    }

    /// Update the extension filter.
    pub fn set_extensions<I, S>(&self, extensions: I, mode: FilterMode)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter.write().apply(extensions, mode);
    }

    /// Resolve `path` against the root and refuse anything that lands outside
    /// it once symlinks are followed.
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let root = self.root();
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        };

        let canonical = joined.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BiglogError::FileNotFound { path: joined.clone() },
            _ => BiglogError::io(format!("Failed to resolve path: {}", joined.display()), e),
        })?;

        if !canonical.starts_with(&root) {
            return Err(BiglogError::OutsideRoot {
                path: path.to_path_buf(),
            });
        }
        Ok(canonical)
    }
}
