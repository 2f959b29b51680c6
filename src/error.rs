//! Error types and handling infrastructure for biglog.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types and `anyhow` for application-level error handling with context.
//!
//! The taxonomy is deliberately small: I/O failures against the underlying file or
//! sink (surfaced verbatim, never retried), range errors for out-of-bounds line
//! addressing, and validation errors rejected before any scan begins.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for biglog operations.
#[derive(Error, Debug)]
pub enum BiglogError {
    /// File system related errors (open, read, or write failures)
    #[error("File operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path exists but is not a regular file
    #[error("Path is not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (root configuration)
    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Path resolves outside the configured root directory
    #[error("Path outside root: {path}")]
    OutsideRoot { path: PathBuf },

    /// Requested start line is outside `[0, lines)`
    #[error("Line {start} out of range: file has {lines} lines")]
    OutOfRange { start: u64, lines: u64 },

    /// Search input rejected before scanning (empty needle, zero limit)
    #[error("Invalid search: {message}")]
    InvalidSearch { message: String },

    /// A range operation was requested while no file is open
    #[error("No file is currently open")]
    NoFileOpen,
}

/// Standard Result type for biglog operations.
pub type Result<T> = std::result::Result<T, BiglogError>;

impl BiglogError {
    /// Create an Io error from an io::Error with additional context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an OutOfRange error for a start line against a line count
    pub fn out_of_range(start: u64, lines: u64) -> Self {
        Self::OutOfRange { start, lines }
    }

    /// Create an InvalidSearch error with a descriptive message
    pub fn invalid_search(message: impl Into<String>) -> Self {
        Self::InvalidSearch {
            message: message.into(),
        }
    }
}

// Automatic conversion from io::Error to BiglogError
impl From<std::io::Error> for BiglogError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => {
                // No path is available at this conversion point, so the
                // path-carrying FileNotFound variant cannot be built here;
                // call sites that know the path construct it directly.
                Self::Io {
                    message: "File not found".to_string(),
                    source: err,
                }
            }
            std::io::ErrorKind::PermissionDenied => Self::Io {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::Io {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}
