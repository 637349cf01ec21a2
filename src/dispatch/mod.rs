//! Batch dispatch of independent work items
//!
//! [`BatchDispatcher`] runs many items through one operation with a hard cap
//! on how many run at once. Per-item failures never escalate to the batch.

pub mod batch;

pub use batch::{BatchDispatcher, BatchOutcome, BatchReport, BatchStatus, DEFAULT_MAX_CONCURRENT};
