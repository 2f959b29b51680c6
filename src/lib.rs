//! # biglog - Large Log File Browser
//!
//! Browse, search, and export very large line-oriented text files without
//! loading them into memory. The core is a sparse line index: one forward scan
//! records the byte offset of every 256th line, and every later range read,
//! streamed export, or substring search seeks to the nearest checkpoint and
//! scans forward from there.
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`store`] - Sparse line index and range-access engine (the core)
//! - [`session`] - Root directory plus the single current open file, behind
//!   readers-writer locking
//! - [`browse`] - Directory listing and extension filtering

pub mod browse;
pub mod error;
pub mod session;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{BiglogError, Result};

pub use browse::{ExtensionFilter, FilterMode};
pub use session::Session;
pub use store::{LineIndex, RangeStore, GROUP_SIZE};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
