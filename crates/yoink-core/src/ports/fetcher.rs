//! Fetcher port: the thing that actually retrieves a video.

use async_trait::async_trait;

use crate::download::{DownloadError, DownloadRequest, FetchEvent, FetchOutcome};

/// Callbacks a fetcher invokes while it runs.
///
/// `on_event` is the cooperative cancellation point: once the owner has
/// been cancelled it returns `Err(DownloadError::Cancelled)` and the
/// fetcher must abort and return that error.
pub trait FetchHooks: Send {
    /// Report one event, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cancelled`] when the job was cancelled.
    fn on_event(&mut self, event: FetchEvent) -> Result<(), DownloadError>;

    /// Poll cancellation without reporting anything.
    fn is_cancelled(&self) -> bool;
}

/// Port for retrieving one request to disk.
///
/// Implementations resolve metadata, transfer the streams, run any
/// post-processing and report progress through `hooks`. They must not
/// retry internally.
#[async_trait]
pub trait FetcherPort: Send + Sync {
    /// Retrieve `request`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cancelled`] when aborted through `hooks`, or
    /// any other variant carrying the fetcher's raw failure text.
    async fn fetch(
        &self,
        request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError>;
}
