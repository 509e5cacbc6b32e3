//! Download manager implementation.
//!
//! This module provides the concrete implementation of `DownloadManagerPort`:
//! a bounded-concurrency FIFO scheduler with URL deduplication, a limit that
//! can change at runtime, cooperative cancellation and a per-job progress
//! table.
//!
//! # Architecture
//!
//! - **Manager**: accepts submissions, answers queries, cancels
//! - **Dispatcher**: single long-lived task admitting queued jobs in order
//! - **Workers**: one task per admitted job, each driving a [`FetchEngine`]
//! - **Relay sinks**: record every snapshot in the table before the caller
//!   sees it
//!
//! # Concurrency Model
//!
//! - One `std::sync::Mutex` guards queue, slot count, progress and the
//!   URL→job map, so admission, release and dedup edits are atomic
//!   relative to each other
//! - `Notify` wakes the dispatcher on submit, release, limit change and
//!   shutdown
//! - A job waits in the queue until a slot is free; the pop, the
//!   cancellation check and the slot reservation happen under one lock
//! - Lowering the limit never interrupts running jobs; raising it admits
//!   waiting jobs immediately

mod state;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use yoink_core::ports::{
    DownloadManagerConfig, DownloadManagerPort, FetcherPort, MetadataPort, ProgressSink,
};
use yoink_core::{
    DownloadError, DownloadProgress, DownloadRequest, FormatOption, JobId, MediaInfo,
};

use crate::engine::FetchEngine;

use state::{CancelOutcome, JobRecord, SchedulerState};
use worker::{RelaySink, Shared, dispatch_loop};

/// Collaborators the manager drives.
#[derive(Clone)]
pub struct DownloadManagerDeps {
    /// Performs the actual transfers.
    pub fetcher: Arc<dyn FetcherPort>,
    /// Answers metadata lookups.
    pub metadata: Arc<dyn MetadataPort>,
}

/// The scheduler.
///
/// Dropping the manager shuts it down.
pub struct DownloadManager {
    shared: Arc<Shared>,
    deps: DownloadManagerDeps,
    progress_interval: Duration,
}

impl DownloadManager {
    /// Create a manager and start its dispatcher.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: DownloadManagerConfig, deps: DownloadManagerDeps) -> Self {
        let shared = Arc::new(Shared::new(config.max_concurrent));
        tokio::spawn(dispatch_loop(Arc::clone(&shared)));
        tracing::debug!(
            target: "yoink.download",
            max_concurrent = shared.lock().max_concurrent(),
            "Download manager created"
        );
        Self {
            shared,
            deps,
            progress_interval: config.progress_interval,
        }
    }

    /// Queue `request`, reporting progress to `sink`.
    ///
    /// Returns `None` without queuing when a non-terminal job already
    /// targets the same URL (unless `force`), when the request's id was
    /// already used, or after shutdown.
    pub fn submit(
        &self,
        request: DownloadRequest,
        sink: Arc<dyn ProgressSink>,
        force: bool,
    ) -> Option<JobId> {
        let id = self.enqueue_locked(&mut self.shared.lock(), request, sink, force)?;
        self.shared.wake.notify_one();
        Some(id)
    }

    fn enqueue_locked(
        &self,
        state: &mut SchedulerState,
        request: DownloadRequest,
        sink: Arc<dyn ProgressSink>,
        force: bool,
    ) -> Option<JobId> {
        let id = request.id.clone();
        if state.is_shutdown() {
            tracing::debug!(target: "yoink.download", id = %id, "Rejected submit after shutdown");
            return None;
        }
        if !force && state.is_duplicate(&request.url) {
            tracing::info!(target: "yoink.download", url = %request.url, "Rejected duplicate download");
            return None;
        }
        if state.contains(&id) {
            tracing::warn!(target: "yoink.download", id = %id, "Rejected reused job id");
            return None;
        }

        let relay: Arc<dyn ProgressSink> = Arc::new(RelaySink::new(
            Arc::downgrade(&self.shared),
            Arc::clone(&sink),
        ));
        let engine = Arc::new(FetchEngine::new(
            request,
            Arc::clone(&self.deps.fetcher),
            relay,
            self.progress_interval,
        ));
        state.enqueue(JobRecord { engine, sink });
        tracing::info!(
            target: "yoink.download",
            id = %id,
            position = state.pending(),
            force,
            "Queued download"
        );
        Some(id)
    }

    /// Cancel a job.
    ///
    /// A queued job is removed and reported `Cancelled` right away; a
    /// running job is signalled and reports `Cancelled` at its fetcher's
    /// next event. Returns `false` for unknown or finished jobs.
    pub fn cancel(&self, id: &JobId) -> bool {
        let outcome = self.shared.lock().cancel(id);
        match outcome {
            CancelOutcome::Unknown | CancelOutcome::Terminal => false,
            CancelOutcome::Dequeued(snapshot, sink) => {
                tracing::info!(target: "yoink.download", id = %id, "Removed download from queue");
                sink.on_progress(snapshot);
                true
            }
            CancelOutcome::Running(engine) => {
                tracing::info!(target: "yoink.download", id = %id, "Cancelling active download");
                engine.cancel();
                true
            }
        }
    }

    /// Resubmit a job that ended in `Error` or `Cancelled`.
    ///
    /// The same request runs again under a fresh id with the duplicate
    /// check bypassed, reporting to `sink`. A job can be retried once;
    /// later calls for the same id return `None`.
    pub fn retry(&self, id: &JobId, sink: Arc<dyn ProgressSink>) -> Option<JobId> {
        let new_id = {
            let mut state = self.shared.lock();
            if state.is_shutdown() {
                return None;
            }
            let request = state.take_retry(id)?;
            tracing::info!(target: "yoink.download", id = %id, new_id = %request.id, "Retrying download");
            self.enqueue_locked(&mut state, request, sink, true)?
        };
        self.shared.wake.notify_one();
        Some(new_id)
    }

    /// Copy of a job's latest snapshot.
    pub fn progress(&self, id: &JobId) -> Option<DownloadProgress> {
        self.shared.lock().progress(id)
    }

    /// Copies of every job's latest snapshot.
    pub fn all_progress(&self) -> Vec<DownloadProgress> {
        self.shared.lock().all_progress()
    }

    /// Current concurrency limit.
    pub fn max_concurrent(&self) -> usize {
        self.shared.lock().max_concurrent()
    }

    /// Change the concurrency limit (clamped to 1..=10).
    ///
    /// Running jobs keep their slots; if the new limit is higher, waiting
    /// jobs are admitted at once.
    pub fn set_max_concurrent(&self, n: usize) {
        let applied = self.shared.lock().set_max_concurrent(n);
        tracing::info!(target: "yoink.download", requested = n, applied, "Set concurrency limit");
        self.shared.wake.notify_one();
    }

    /// Number of jobs holding a slot.
    pub fn active_count(&self) -> usize {
        self.shared.lock().active()
    }

    /// Number of jobs waiting for a slot.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending()
    }

    /// Cancel every queued and running job and stop the dispatcher.
    ///
    /// Idempotent. Later submissions are rejected.
    pub fn shutdown(&self) {
        let (dequeued, running) = {
            let mut state = self.shared.lock();
            if state.is_shutdown() {
                return;
            }
            state.begin_shutdown()
        };
        tracing::info!(
            target: "yoink.download",
            queued = dequeued.len(),
            running = running.len(),
            "Shutting down download manager"
        );
        for (snapshot, sink) in dequeued {
            sink.on_progress(snapshot);
        }
        for engine in running {
            engine.cancel();
        }
        self.shared.wake.notify_one();
    }

    /// Resolve a URL to video or playlist metadata.
    pub async fn resolve_metadata(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        self.deps.metadata.fetch(url).await
    }

    /// Whether a URL points at a playlist.
    pub async fn is_collection(&self, url: &str) -> Result<bool, DownloadError> {
        self.deps.metadata.is_playlist(url).await
    }

    /// Curated formats for a video URL.
    pub async fn formats(&self, url: &str) -> Result<Vec<FormatOption>, DownloadError> {
        self.deps.metadata.formats(url).await
    }
}

impl Drop for DownloadManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl DownloadManagerPort for DownloadManager {
    fn submit(
        &self,
        request: DownloadRequest,
        sink: Arc<dyn ProgressSink>,
        force: bool,
    ) -> Option<JobId> {
        Self::submit(self, request, sink, force)
    }

    fn cancel(&self, id: &JobId) -> bool {
        Self::cancel(self, id)
    }

    fn retry(&self, id: &JobId, sink: Arc<dyn ProgressSink>) -> Option<JobId> {
        Self::retry(self, id, sink)
    }

    fn progress(&self, id: &JobId) -> Option<DownloadProgress> {
        Self::progress(self, id)
    }

    fn all_progress(&self) -> Vec<DownloadProgress> {
        Self::all_progress(self)
    }

    fn max_concurrent(&self) -> usize {
        Self::max_concurrent(self)
    }

    fn set_max_concurrent(&self, n: usize) {
        Self::set_max_concurrent(self, n);
    }

    fn active_count(&self) -> usize {
        Self::active_count(self)
    }

    fn pending_count(&self) -> usize {
        Self::pending_count(self)
    }

    fn shutdown(&self) {
        Self::shutdown(self);
    }

    async fn resolve_metadata(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        Self::resolve_metadata(self, url).await
    }

    async fn is_collection(&self, url: &str) -> Result<bool, DownloadError> {
        Self::is_collection(self, url).await
    }

    async fn formats(&self, url: &str) -> Result<Vec<FormatOption>, DownloadError> {
        Self::formats(self, url).await
    }
}
