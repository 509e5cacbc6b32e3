//! Download manager port definition.
//!
//! This port defines the caller-facing surface of the scheduler. It hides
//! the dispatcher task, cancellation tokens and the fetcher behind a small
//! object-safe API.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::ProgressSink;
use crate::download::{DownloadError, DownloadProgress, DownloadRequest, JobId};
use crate::media::{FormatOption, MediaInfo};

/// Lowest accepted concurrency limit.
pub const MIN_CONCURRENT: usize = 1;
/// Highest accepted concurrency limit.
pub const MAX_CONCURRENT: usize = 10;
/// Concurrency limit used when none is configured.
pub const DEFAULT_CONCURRENT: usize = 3;

/// Clamp a requested concurrency limit into the valid range.
#[must_use]
pub const fn clamp_concurrency(n: usize) -> usize {
    if n < MIN_CONCURRENT {
        MIN_CONCURRENT
    } else if n > MAX_CONCURRENT {
        MAX_CONCURRENT
    } else {
        n
    }
}

/// Configuration for creating a download manager.
#[derive(Debug, Clone)]
pub struct DownloadManagerConfig {
    /// Maximum concurrent downloads, clamped to 1..=10.
    pub max_concurrent: usize,
    /// Minimum spacing between unforced progress notifications per job.
    pub progress_interval: Duration,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_CONCURRENT,
            progress_interval: Duration::from_millis(100),
        }
    }
}

impl DownloadManagerConfig {
    /// Set the maximum concurrent downloads (clamped).
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = clamp_concurrency(max);
        self
    }

    /// Set the progress throttle interval.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

/// Port for the download scheduler.
///
/// # Usage
///
/// ```ignore
/// let manager: Arc<dyn DownloadManagerPort> = /* ... */;
///
/// let request = DownloadRequest::new("https://www.youtube.com/watch?v=...");
/// let Some(id) = manager.submit(request, Arc::new(NoopProgressSink), false) else {
///     // already downloading
///     return;
/// };
///
/// manager.cancel(&id);
/// ```
#[async_trait]
pub trait DownloadManagerPort: Send + Sync {
    /// Queue a request.
    ///
    /// Returns `None` when a non-terminal job already targets the same URL
    /// and `force` is false, or after shutdown.
    fn submit(
        &self,
        request: DownloadRequest,
        sink: Arc<dyn ProgressSink>,
        force: bool,
    ) -> Option<JobId>;

    /// Cancel a job. Returns `true` if the job was known and not yet terminal.
    fn cancel(&self, id: &JobId) -> bool;

    /// Resubmit a failed or cancelled job under a new id, reporting to
    /// `sink`. Each job can be retried once.
    fn retry(&self, id: &JobId, sink: Arc<dyn ProgressSink>) -> Option<JobId>;

    /// Copy of one job's progress.
    fn progress(&self, id: &JobId) -> Option<DownloadProgress>;

    /// Copies of every job's progress, in no particular order.
    fn all_progress(&self) -> Vec<DownloadProgress>;

    /// Current concurrency limit.
    fn max_concurrent(&self) -> usize;

    /// Change the concurrency limit; running jobs are never interrupted.
    fn set_max_concurrent(&self, n: usize);

    /// Number of jobs holding a slot.
    fn active_count(&self) -> usize;

    /// Number of jobs waiting for a slot.
    fn pending_count(&self) -> usize;

    /// Cancel everything and stop admitting work.
    fn shutdown(&self);

    /// Resolve a URL to video or playlist metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata source fails.
    async fn resolve_metadata(&self, url: &str) -> Result<MediaInfo, DownloadError>;

    /// Whether a URL points at a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata source fails.
    async fn is_collection(&self, url: &str) -> Result<bool, DownloadError>;

    /// Curated formats for a video URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata source fails.
    async fn formats(&self, url: &str) -> Result<Vec<FormatOption>, DownloadError>;
}
