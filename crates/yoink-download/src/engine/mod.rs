//! Fetch Engine: executes exactly one download request.
//!
//! The engine wraps a [`FetcherPort`] call with progress mapping,
//! throttling and cooperative cancellation. It never fails: every outcome,
//! including local I/O errors and fetcher failures, ends up in the returned
//! snapshot.
//!
//! # Cancellation
//!
//! [`FetchEngine::cancel`] trips a [`CancellationToken`]. The fetcher sees it
//! at its next callback (`on_event` returns `Err(Cancelled)`), and the engine
//! also races the fetch against the token so a fetcher stuck between events
//! is dropped rather than awaited.

mod hooks;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use yoink_core::download::{DownloadError, DownloadStatus};
use yoink_core::ports::{FetcherPort, ProgressSink};
use yoink_core::{DownloadProgress, DownloadRequest, JobId};

use crate::progress::ProgressThrottle;

use hooks::EngineHooks;

/// Runs one [`DownloadRequest`] through a fetcher.
pub struct FetchEngine {
    request: DownloadRequest,
    fetcher: Arc<dyn FetcherPort>,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
    cancel: CancellationToken,
}

impl FetchEngine {
    /// Create an engine for `request`, reporting to `sink` at most once per
    /// `interval` (status transitions excepted).
    pub fn new(
        request: DownloadRequest,
        fetcher: Arc<dyn FetcherPort>,
        sink: Arc<dyn ProgressSink>,
        interval: Duration,
    ) -> Self {
        Self {
            request,
            fetcher,
            sink,
            interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Job this engine runs.
    pub const fn id(&self) -> &JobId {
        &self.request.id
    }

    /// The request being executed.
    pub const fn request(&self) -> &DownloadRequest {
        &self.request
    }

    /// Request cancellation. Idempotent; takes effect at the fetcher's next
    /// checked event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A clone of the engine's cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the request and return the terminal snapshot.
    ///
    /// The terminal snapshot is always delivered to the sink as well.
    pub async fn run(&self) -> DownloadProgress {
        let throttle = ProgressThrottle::new(self.interval);
        let mut hooks = EngineHooks::new(
            DownloadProgress::queued(self.request.id.clone()),
            throttle,
            self.sink.as_ref(),
            &self.cancel,
        );

        if self.cancel.is_cancelled() {
            tracing::debug!(target: "yoink.download", id = %self.request.id, "Cancelled before start");
            hooks.progress.cancel();
            hooks.emit(true);
            return hooks.progress;
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.request.output_dir).await {
            let err = DownloadError::from(e);
            tracing::warn!(
                target: "yoink.download",
                id = %self.request.id,
                dir = %self.request.output_dir.display(),
                error = %err,
                "Output directory unavailable"
            );
            hooks.progress.fail(err.to_string());
            hooks.emit(true);
            return hooks.progress;
        }

        hooks.progress.advance(DownloadStatus::Downloading);
        hooks.emit(true);

        let result = {
            let fetch = self.fetcher.fetch(&self.request, &mut hooks);
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => Err(DownloadError::Cancelled),

                result = fetch => result,
            }
        };

        match result {
            Ok(outcome) => {
                if outcome.output_path.is_some() {
                    hooks.progress.output_path = outcome.output_path;
                }
                hooks.progress.finish();
                tracing::info!(target: "yoink.download", id = %self.request.id, "Download finished");
            }
            Err(DownloadError::Cancelled) => {
                hooks.progress.cancel();
                tracing::info!(target: "yoink.download", id = %self.request.id, "Download cancelled");
            }
            Err(e) => {
                tracing::warn!(target: "yoink.download", id = %self.request.id, error = %e, "Download failed");
                hooks.progress.fail(e.to_string());
            }
        }
        hooks.emit(true);
        hooks.progress
    }
}

impl std::fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine")
            .field("id", &self.request.id)
            .field("url", &self.request.url)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
