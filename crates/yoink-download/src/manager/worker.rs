//! Dispatcher loop, per-job worker tasks and the progress relay.
//!
//! # Concurrency Model
//!
//! - One long-lived dispatcher task pops the queue head whenever a slot is
//!   free and sleeps on `Notify` otherwise
//! - Each admitted job runs on its own task holding a [`SlotGuard`]
//! - The guard releases the slot and wakes the dispatcher when the task
//!   ends, including by panic
//! - Sinks are never called with the scheduler lock held

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::Notify;

use yoink_core::ports::ProgressSink;
use yoink_core::{DownloadProgress, JobId};

use crate::engine::FetchEngine;

use super::state::{Admission, SchedulerState};

/// State shared by the manager, the dispatcher, workers and relay sinks.
pub(super) struct Shared {
    state: Mutex<SchedulerState>,
    pub(super) wake: Notify,
}

impl Shared {
    pub(super) fn new(max_concurrent: usize) -> Self {
        Self {
            state: Mutex::new(SchedulerState::new(max_concurrent)),
            wake: Notify::new(),
        }
    }

    /// Lock the scheduler state.
    ///
    /// A panic while holding the lock cannot leave the state half-updated
    /// (every method is a handful of map edits), so poisoning is ignored.
    pub(super) fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wraps the caller's sink: stores each snapshot in the progress table,
/// then forwards it.
pub(super) struct RelaySink {
    shared: Weak<Shared>,
    inner: Arc<dyn ProgressSink>,
}

impl RelaySink {
    pub(super) const fn new(shared: Weak<Shared>, inner: Arc<dyn ProgressSink>) -> Self {
        Self { shared, inner }
    }
}

impl ProgressSink for RelaySink {
    fn on_progress(&self, progress: DownloadProgress) {
        let accepted = self
            .shared
            .upgrade()
            .is_some_and(|shared| shared.lock().record(&progress));
        if accepted {
            self.inner.on_progress(progress);
        }
    }
}

/// Releases a concurrency slot when dropped.
struct SlotGuard {
    shared: Arc<Shared>,
    id: JobId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let abandoned = self.shared.lock().release(&self.id);
        if let Some((snapshot, sink)) = abandoned {
            tracing::error!(target: "yoink.download", id = %self.id, "Worker ended without a final status");
            sink.on_progress(snapshot);
        }
        self.shared.wake.notify_one();
    }
}

/// The dispatcher. Runs until shutdown.
pub(super) async fn dispatch_loop(shared: Arc<Shared>) {
    tracing::debug!(target: "yoink.download", "Dispatcher started");
    loop {
        let admission = shared.lock().next_admission();
        match admission {
            Admission::Run(engine) => spawn_worker(Arc::clone(&shared), engine),
            Admission::Skip(snapshot, sink) => {
                tracing::debug!(target: "yoink.download", id = %snapshot.id, "Skipping cancelled job");
                sink.on_progress(snapshot);
            }
            Admission::Idle => shared.wake.notified().await,
            Admission::Stop => break,
        }
    }
    tracing::debug!(target: "yoink.download", "Dispatcher stopped");
}

/// Run an admitted engine on its own task. The slot was reserved by
/// [`SchedulerState::next_admission`].
fn spawn_worker(shared: Arc<Shared>, engine: Arc<FetchEngine>) {
    let guard = SlotGuard {
        shared,
        id: engine.id().clone(),
    };
    tracing::info!(
        target: "yoink.download",
        id = %engine.id(),
        url = %engine.request().url,
        "Download started"
    );
    tokio::spawn(async move {
        let _guard = guard;
        let last = engine.run().await;
        tracing::debug!(
            target: "yoink.download",
            id = %last.id,
            status = %last.status,
            "Worker finished"
        );
    });
}
