//! Directory listing and extension filtering for the browsing root.
//!
//! Files are offered for browsing when their extension is in the active filter
//! set, or — when the `*` wildcard is enabled — when their first bytes sniff as
//! text. Listing is recursive and returns root-relative paths; unreadable
//! entries are skipped rather than failing the whole walk.

use crate::error::Result;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Extensions admitted by a freshly constructed filter.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".log", ".txt", ".html", ".htm", ".csv", ".tsv", ".json", ".ndjson", ".xml", ".md", ".js",
    ".css",
];

/// Bytes sniffed from the head of a file to decide whether it looks like text.
const SNIFF_LEN: usize = 512;

/// How a new set of extensions combines with the current filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Add the given extensions to the current set
    Merge,
    /// Reset to the defaults plus the given extensions
    Replace,
}

/// The set of file extensions admitted when listing the browsing root.
///
/// Extensions are normalized on the way in: trimmed, lowercased, and given a
/// leading dot. The special entry `*` admits any file whose content sniffs as
/// text, regardless of extension.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    set: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Filter admitting the default extension set.
    pub fn new() -> Self {
        let mut filter = Self {
            set: BTreeSet::new(),
        };
        filter.extend_normalized(DEFAULT_EXTENSIONS.iter().copied());
        filter
    }

    /// Apply `extensions` according to `mode`.
    pub fn apply<I, S>(&mut self, extensions: I, mode: FilterMode)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if mode == FilterMode::Replace {
            self.set.clear();
            self.extend_normalized(DEFAULT_EXTENSIONS.iter().copied());
        }
        self.extend_normalized(extensions);
    }

    /// Current extensions in sorted order.
    pub fn extensions(&self) -> Vec<String> {
        self.set.iter().cloned().collect()
    }

    /// Whether the `*` wildcard is active.
    pub fn allows_any_text(&self) -> bool {
        self.set.contains("*")
    }

    /// Decide whether `path` should be offered for browsing.
    ///
    /// Extension membership is checked first; the content sniff only runs when
    /// the wildcard is active and the extension alone does not qualify.
    pub fn admits(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));

        match ext {
            Some(ext) if self.set.contains(&ext) => true,
            _ => self.allows_any_text() && is_probably_text(path),
        }
    }

    fn extend_normalized<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            if let Some(normalized) = normalize_extension(ext.as_ref()) {
                self.set.insert(normalized);
            }
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim, lowercase, and dot-prefix an extension; `*` passes through, empty
/// entries are dropped.
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() {
        return None;
    }
    if ext == "*" {
        return Some(ext);
    }
    if ext.starts_with('.') {
        Some(ext)
    } else {
        Some(format!(".{}", ext))
    }
}

/// Recursively list files under `root` admitted by `filter`, as sorted
/// root-relative paths.
pub fn list_files(root: &Path, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    walk(root, root, filter, &mut out);
    out.sort();
    Ok(out)
}

fn walk(dir: &Path, root: &Path, filter: &ExtensionFilter, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("skipping unreadable directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, root, filter, out);
        } else if filter.admits(&path) {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_path_buf());
            }
        }
    }
}

/// Sniff the head of a file for a NUL byte. Empty and unopenable files count
/// as text and binary respectively.
fn is_probably_text(path: &Path) -> bool {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut buf = [0u8; SNIFF_LEN];
    let read = match file.read(&mut buf) {
        Ok(read) => read,
        Err(_) => return false,
    };
    if read == 0 {
        return true;
    }
    !buf[..read].contains(&0x00)
}
