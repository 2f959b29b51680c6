//! Sparse line index and range-access engine.
//!
//! This is the core of biglog: [`line_index::LineIndex`] maps logical line
//! numbers to byte offsets via fixed-size checkpoint groups, and
//! [`range_store::RangeStore`] uses it to serve range reads, streamed exports,
//! and bounded substring searches against one open file.

pub mod line_index;
pub mod range_store;
pub(crate) mod section;

pub use line_index::{LineIndex, GROUP_SIZE};
pub use range_store::RangeStore;
