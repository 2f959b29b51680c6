//! Positioned reader over a borrowed file handle.
//!
//! Every range operation scans forward from a checkpoint. Those scans must not
//! move a shared file cursor, or concurrent reads against the same store would
//! race each other. `SectionReader` therefore issues positional reads
//! (`pread`-style) against the borrowed handle and tracks its own offset.

use std::fs::File;
use std::io::{self, Read};

/// An `io::Read` view of a file starting at a fixed byte offset.
///
/// Does not touch the file's seek position; safe to use from any number of
/// threads against the same `File`.
#[derive(Debug)]
pub(crate) struct SectionReader<'a> {
    file: &'a File,
    pos: u64,
}

impl<'a> SectionReader<'a> {
    pub(crate) fn new(file: &'a File, offset: u64) -> Self {
        Self { file, pos: offset }
    }
}

impl Read for SectionReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        #[cfg(unix)]
        let n = {
            use std::os::unix::fs::FileExt;
            self.file.read_at(buf, self.pos)?
        };

        #[cfg(windows)]
        let n = {
            use std::os::windows::fs::FileExt;
            self.file.seek_read(buf, self.pos)?
        };

        self.pos += n as u64;
        Ok(n)
    }
}
