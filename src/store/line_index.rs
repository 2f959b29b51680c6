//! Sparse checkpoint index over the lines of a file.
//!
//! Rather than recording every line's byte offset (unaffordable for files with
//! tens of millions of lines), the index records the offset of every
//! [`GROUP_SIZE`]th line in one forward scan. Reaching an arbitrary line then
//! costs a seek to the nearest checkpoint at or below it plus a forward scan of
//! at most `GROUP_SIZE - 1` lines. `GROUP_SIZE` is the space/scan-time dial:
//! larger groups shrink the index, smaller groups shorten the forward scan.

use crate::error::Result;
use memchr::memchr_iter;
use std::io::Read;

/// Number of lines per checkpoint group.
pub const GROUP_SIZE: u64 = 256;

/// Read buffer size for the construction scan and for forward scans.
pub(crate) const SCAN_BUF_SIZE: usize = 1 << 20;

/// Sparse line index: byte offsets of every [`GROUP_SIZE`]th line plus the
/// total line count.
///
/// Immutable after construction, so it can be shared freely across concurrent
/// read operations. A "line" is a maximal run of bytes up to and including a
/// trailing `\n`, or the final unterminated run at end-of-file; terminators are
/// never normalized away.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `checkpoints[g]` = byte offset of line `g * GROUP_SIZE`.
    ///
    /// Holds `ceil(line_count / GROUP_SIZE)` entries; empty for an empty file.
    checkpoints: Vec<u64>,

    /// Total number of lines in the file at index-build time.
    line_count: u64,
}

impl LineIndex {
    /// Build the index by streaming the file once through `reader`.
    ///
    /// Cost is O(file size); newline detection uses memchr. Any read error
    /// aborts construction, so no partially built index ever escapes.
    pub fn build(mut reader: impl Read) -> Result<Self> {
        let mut checkpoints = Vec::new();
        let mut buf = vec![0u8; SCAN_BUF_SIZE];

        let mut lines: u64 = 0;
        let mut pos: u64 = 0; // offset of the next unread byte
        let mut line_start: u64 = 0; // offset where the current line began

        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            for nl in memchr_iter(b'\n', &buf[..read]) {
                // The newline completes line `lines`, which began at line_start.
                if lines % GROUP_SIZE == 0 {
                    checkpoints.push(line_start);
                }
                lines += 1;
                line_start = pos + nl as u64 + 1;
            }
            pos += read as u64;
        }

        // Final unterminated run still counts as a line.
        if line_start < pos {
            if lines % GROUP_SIZE == 0 {
                checkpoints.push(line_start);
            }
            lines += 1;
        }

        Ok(Self {
            checkpoints,
            line_count: lines,
        })
    }

    /// Total number of lines in the indexed file.
    pub fn line_count(&self) -> u64 {
        self.line_count
    }

    /// Checkpoint group containing `line`.
    pub fn group_of(line: u64) -> u64 {
        line / GROUP_SIZE
    }

    /// Byte offset of the first line of group `group`, if that group exists.
    pub fn checkpoint(&self, group: u64) -> Option<u64> {
        self.checkpoints.get(group as usize).copied()
    }

    /// Number of checkpoint groups.
    pub fn group_count(&self) -> u64 {
        self.checkpoints.len() as u64
    }
}
