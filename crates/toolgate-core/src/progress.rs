//! Incremental progress reporting for long-running tool calls.
//!
//! Adapters report through the [`ProgressSink`] trait; how the events reach
//! the client (notification, log line, nothing) is the caller's concern, so
//! adapters stay decoupled from any particular transport or concurrency
//! primitive.

use std::sync::Arc;

pub trait ProgressSink: Send + Sync {
    /// Report items processed so far, with the total when known
    fn report(&self, progress: u64, total: Option<u64>);
}

/// Discards all progress events
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _progress: u64, _total: Option<u64>) {}
}

pub fn null_progress() -> Arc<dyn ProgressSink> {
    Arc::new(NullProgress)
}
