//! Progress sink port.
//!
//! Observers receive an owned copy of the snapshot on every accepted
//! update. Sinks are called from worker tasks and must not block.

use crate::download::DownloadProgress;

/// Receiver for progress snapshots.
pub trait ProgressSink: Send + Sync {
    /// Handle one snapshot.
    fn on_progress(&self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(DownloadProgress) + Send + Sync,
{
    fn on_progress(&self, progress: DownloadProgress) {
        self(progress);
    }
}

/// A sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

impl NoopProgressSink {
    /// Create a new no-op sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProgressSink for NoopProgressSink {
    fn on_progress(&self, _progress: DownloadProgress) {}
}
