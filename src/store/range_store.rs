//! Range-access engine over an open file and its sparse line index.
//!
//! A `RangeStore` pairs exactly one read handle with the `LineIndex` built from
//! it. Every operation re-derives byte positions from the index: seek to the
//! checkpoint at or below the requested start line, then scan forward. The
//! forward-scan cost of a read is `(start mod GROUP_SIZE) + (end - start)`
//! lines, never the whole file.
//!
//! All operations take `&self` and read through positional I/O, so any number
//! of reads, exports, and searches may run concurrently against one store.

use crate::error::{BiglogError, Result};
use crate::store::line_index::{LineIndex, GROUP_SIZE, SCAN_BUF_SIZE};
use crate::store::section::SectionReader;
use bstr::{BString, ByteSlice};
use memchr::memmem;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// An open file plus its line index, exclusively owned by the active session.
///
/// The index is immutable after construction; the store never mutates the file.
/// Dropping the store closes the handle.
#[derive(Debug)]
pub struct RangeStore {
    path: PathBuf,
    file: File,
    index: LineIndex,
}

impl RangeStore {
    /// Open `path` and build its line index with one forward scan.
    ///
    /// Fails if the path is missing, not a regular file, or unreadable. A read
    /// error during the scan aborts the open; the caller never sees a
    /// partially built store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BiglogError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => BiglogError::io(format!("Failed to open file: {}", path.display()), e),
        })?;

        let metadata = file
            .metadata()
            .map_err(|e| BiglogError::io("Failed to read file metadata", e))?;
        if !metadata.is_file() {
            return Err(BiglogError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        // The construction scan moves this handle's cursor; later operations
        // only use positional reads, so the cursor position is irrelevant.
        let index = LineIndex::build(&file)?;
        log::debug!(
            "indexed {}: {} lines, {} checkpoint groups",
            path.display(),
            index.line_count(),
            index.group_count()
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            index,
        })
    }

    /// Path this store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of lines at index-build time.
    pub fn line_count(&self) -> u64 {
        self.index.line_count()
    }

    /// Scan lines `[start, end)`, invoking `emit` with each line's number and
    /// raw bytes (terminator included). Assumes `start < end`.
    ///
    /// Seeks to the checkpoint for `start`'s group and discards lines before
    /// `start`. Stops early at end-of-file rather than failing, so a file
    /// shorter than the index claims yields fewer lines, not an error.
    fn scan_range(
        &self,
        start: u64,
        end: u64,
        mut emit: impl FnMut(u64, &[u8]) -> Result<()>,
    ) -> Result<()> {
        let group = LineIndex::group_of(start);
        let offset = self.index.checkpoint(group).ok_or_else(|| {
            // Should not occur given the index invariant; surfaced, not panicked.
            BiglogError::io(
                format!("no checkpoint for line group {}", group),
                std::io::Error::new(std::io::ErrorKind::InvalidData, "checkpoint missing"),
            )
        })?;

        let section = SectionReader::new(&self.file, offset);
        let mut reader = BufReader::with_capacity(SCAN_BUF_SIZE, section);
        let mut line = Vec::new();

        let mut number = group * GROUP_SIZE;
        while number < end {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| BiglogError::io("Failed to read line from file", e))?;
            if read == 0 {
                break;
            }
            if number >= start {
                emit(number, &line)?;
            }
            number += 1;
        }
        Ok(())
    }

    /// Materialize lines `[start, start + count)`.
    ///
    /// `start` must be within `[0, line_count)`; `count` is clamped so the
    /// effective end never exceeds the line count. Each returned line carries
    /// its original bytes untouched, terminator included — concatenating a
    /// full-suffix read reproduces the file exactly, even when the content is
    /// not valid UTF-8.
    pub fn read_lines(&self, start: u64, count: u64) -> Result<Vec<BString>> {
        let lines = self.index.line_count();
        if start >= lines {
            return Err(BiglogError::out_of_range(start, lines));
        }
        let end = start.saturating_add(count).min(lines);

        let mut out = Vec::with_capacity((end - start).min(1024) as usize);
        self.scan_range(start, end, |_, bytes| {
            out.push(BString::from(bytes));
            Ok(())
        })?;
        Ok(out)
    }

    /// Stream lines `[start, end)` to `sink` without materializing them.
    ///
    /// `end` is clamped to `[start, line_count]`; an empty effective range
    /// writes nothing and succeeds, so a start at or beyond the last line of a
    /// non-empty file is a no-op rather than an error. On an empty file only
    /// `start == 0` is accepted; any other start has no checkpoint group at
    /// all and is rejected. The raw line bytes are written untouched, one line
    /// buffer at a time. A sink or source failure aborts immediately; bytes
    /// already written stand.
    pub fn write_range(&self, sink: &mut dyn Write, start: u64, end: u64) -> Result<()> {
        let lines = self.index.line_count();
        if lines == 0 {
            if start > 0 {
                return Err(BiglogError::out_of_range(start, lines));
            }
            return Ok(());
        }
        let end = end.min(lines).max(start);
        if start >= end {
            return Ok(());
        }

        self.scan_range(start, end, |_, bytes| {
            sink.write_all(bytes)
                .map_err(|e| BiglogError::io("Failed to write line to sink", e))
        })
    }

    /// Case-insensitive substring search, returning at most `limit` matching
    /// line numbers in ascending order.
    ///
    /// Scans checkpoint groups in order, materializing one bounded batch at a
    /// time, and stops as soon as `limit` matches are found — later groups are
    /// never touched. A query with few matches still scans the whole file once.
    ///
    /// An empty `needle` or a zero `limit` is rejected before any scan begins.
    pub fn search(&self, needle: &str, limit: usize) -> Result<Vec<u64>> {
        if needle.is_empty() {
            return Err(BiglogError::invalid_search("empty search term"));
        }
        if limit == 0 {
            return Err(BiglogError::invalid_search("limit must be positive"));
        }

        let lowered = needle.to_lowercase();
        let finder = memmem::Finder::new(lowered.as_bytes());

        let lines = self.index.line_count();
        let mut matches: Vec<u64> = Vec::with_capacity(limit.min(1024));
        let mut lower_buf = Vec::new();

        let mut group = 0u64;
        while group * GROUP_SIZE < lines && matches.len() < limit {
            let batch_start = group * GROUP_SIZE;
            let batch_end = (batch_start + GROUP_SIZE).min(lines);

            self.scan_range(batch_start, batch_end, |number, bytes| {
                if matches.len() < limit {
                    lower_buf.clear();
                    bytes.to_lowercase_into(&mut lower_buf);
                    if finder.find(&lower_buf).is_some() {
                        matches.push(number);
                    }
                }
                Ok(())
            })?;

            group += 1;
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    /// Create a temporary test file with known content
    fn create_test_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write test data");
        file.flush().expect("Failed to flush test data");
        file
    }

    /// n newline-terminated numbered lines
    fn numbered_content(n: usize) -> Vec<u8> {
        let mut out = Vec::new();
        for i in 0..n {
            out.extend_from_slice(format!("line {}\n", i).as_bytes());
        }
        out
    }

    #[test]
    fn test_open_and_line_count() {
        let tmp = create_test_file(b"a\nb\nc\n");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert_eq!(store.line_count(), 3);
        assert_eq!(store.path(), tmp.path());
    }

    #[test]
    fn test_open_missing_file() {
        let result = RangeStore::open("/this/file/does/not/exist.log");
        assert!(matches!(result, Err(BiglogError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_lines_keeps_terminators() {
        let tmp = create_test_file(b"first\nsecond\nlast without newline");
        let store = RangeStore::open(tmp.path()).unwrap();

        let lines = store.read_lines(0, 3).unwrap();
        assert_eq!(lines, vec!["first\n", "second\n", "last without newline"]);
    }

    #[test]
    fn test_read_lines_preserves_non_utf8_bytes() {
        // 0xE9 is a bare Latin-1 'é'; the bytes must come back untouched,
        // not replaced with U+FFFD
        let content = b"caf\xe9 line one\nsecond line\n";
        let tmp = create_test_file(content);
        let store = RangeStore::open(tmp.path()).unwrap();

        let lines = store.read_lines(0, store.line_count()).unwrap();
        let joined: Vec<u8> = lines.iter().flat_map(|l| l.iter().copied()).collect();
        assert_eq!(joined, content);
    }

    #[test]
    fn test_read_lines_clamps_count() {
        let tmp = create_test_file(b"a\nb\nc\n");
        let store = RangeStore::open(tmp.path()).unwrap();

        let lines = store.read_lines(1, 100).unwrap();
        assert_eq!(lines, vec!["b\n", "c\n"]);
    }

    #[test]
    fn test_read_lines_zero_count() {
        let tmp = create_test_file(b"a\nb\n");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert!(store.read_lines(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_read_lines_start_out_of_range() {
        let tmp = create_test_file(b"a\nb\n");
        let store = RangeStore::open(tmp.path()).unwrap();

        let result = store.read_lines(2, 1);
        assert!(matches!(
            result,
            Err(BiglogError::OutOfRange { start: 2, lines: 2 })
        ));
    }

    #[test]
    fn test_read_lines_empty_file_always_out_of_range() {
        let tmp = create_test_file(b"");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert_eq!(store.line_count(), 0);

        for start in [0u64, 1, 1000] {
            assert!(matches!(
                store.read_lines(start, 1),
                Err(BiglogError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_read_crosses_checkpoint_boundary() {
        // 300 lines, groups of 256: line 255 ends group 0, line 256 starts group 1
        let tmp = create_test_file(&numbered_content(300));
        let store = RangeStore::open(tmp.path()).unwrap();

        let lines = store.read_lines(255, 3).unwrap();
        assert_eq!(lines, vec!["line 255\n", "line 256\n", "line 257\n"]);
    }

    #[test]
    fn test_read_from_second_group() {
        let tmp = create_test_file(&numbered_content(600));
        let store = RangeStore::open(tmp.path()).unwrap();

        let lines = store.read_lines(400, 2).unwrap();
        assert_eq!(lines, vec!["line 400\n", "line 401\n"]);
    }

    #[test]
    fn test_write_range_reproduces_bytes() {
        let content = numbered_content(300);
        let tmp = create_test_file(&content);
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = Vec::new();
        store.write_range(&mut sink, 0, 300).unwrap();
        assert_eq!(sink, content);
    }

    #[test]
    fn test_write_range_empty_range() {
        let tmp = create_test_file(&numbered_content(300));
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = Vec::new();
        store.write_range(&mut sink, 100, 100).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_range_empty_file() {
        let tmp = create_test_file(b"");
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = Vec::new();
        store.write_range(&mut sink, 0, 10).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_range_empty_file_rejects_nonzero_start() {
        let tmp = create_test_file(b"");
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = Vec::new();
        assert!(matches!(
            store.write_range(&mut sink, 1, 10),
            Err(BiglogError::OutOfRange { start: 1, lines: 0 })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_write_range_clamps_end() {
        let tmp = create_test_file(b"a\nb\nc");
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = Vec::new();
        store.write_range(&mut sink, 1, 999).unwrap();
        assert_eq!(sink, b"b\nc");
    }

    #[test]
    fn test_write_range_sink_failure_surfaces() {
        struct FailingSink;
        impl std::io::Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "sink broke"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let tmp = create_test_file(b"a\nb\n");
        let store = RangeStore::open(tmp.path()).unwrap();

        let mut sink = FailingSink;
        let result = store.write_range(&mut sink, 0, 2);
        assert!(matches!(result, Err(BiglogError::Io { .. })));
    }

    #[test]
    fn test_search_case_insensitive() {
        let tmp = create_test_file(b"INFO start\nwarn disk\nerror one\nERROR two\nok\n");
        let store = RangeStore::open(tmp.path()).unwrap();

        let matches = store.search("Error", 10).unwrap();
        assert_eq!(matches, vec![2, 3]);
    }

    #[test]
    fn test_search_respects_limit() {
        let content = b"match\n".repeat(1000);
        let tmp = create_test_file(&content);
        let store = RangeStore::open(tmp.path()).unwrap();

        let matches = store.search("match", 10).unwrap();
        assert_eq!(matches, (0..10).collect::<Vec<u64>>());
    }

    #[test]
    fn test_search_across_groups() {
        // Needle only appears on lines 0 and 290, in different checkpoint groups
        let mut content = Vec::new();
        for i in 0..300 {
            if i == 0 || i == 290 {
                content.extend_from_slice(format!("needle {}\n", i).as_bytes());
            } else {
                content.extend_from_slice(format!("line {}\n", i).as_bytes());
            }
        }
        let tmp = create_test_file(&content);
        let store = RangeStore::open(tmp.path()).unwrap();

        let matches = store.search("NEEDLE", 10).unwrap();
        assert_eq!(matches, vec![0, 290]);
    }

    #[test]
    fn test_search_no_matches() {
        let tmp = create_test_file(b"a\nb\nc\n");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert!(store.search("zzz", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_empty_needle() {
        let tmp = create_test_file(b"a\n");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.search("", 10),
            Err(BiglogError::InvalidSearch { .. })
        ));
    }

    #[test]
    fn test_search_rejects_zero_limit() {
        let tmp = create_test_file(b"a\n");
        let store = RangeStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.search("a", 0),
            Err(BiglogError::InvalidSearch { .. })
        ));
    }

    #[test]
    fn test_concurrent_reads() {
        let content = numbered_content(600);
        let tmp = create_test_file(&content);
        let store = std::sync::Arc::new(RangeStore::open(tmp.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let start = (t * 70) as u64;
                    let lines = store.read_lines(start, 5).unwrap();
                    assert_eq!(lines[0], format!("line {}\n", start));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
