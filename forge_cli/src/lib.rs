//! Batch driver for the expression conditioning engine
//!
//! The engine itself never touches the file system; this crate is the
//! enclosing application: it discovers record documents, fans them out
//! over a bounded worker pool and writes artifact JSON next to each
//! input.

pub mod batch;
pub mod records;

pub use batch::{BatchConfig, BatchError, BatchResults};
pub use records::{load_records, write_artifacts, RecordError};
