//! Scheduler bookkeeping guarded by the manager's mutex.
//!
//! Every method here runs with the lock held and never awaits or calls out
//! to a sink. Callers collect what needs notifying and deliver it after the
//! guard is dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use yoink_core::ports::{ProgressSink, clamp_concurrency};
use yoink_core::{DownloadProgress, DownloadRequest, DownloadStatus, JobId};

use crate::engine::FetchEngine;

/// A submitted job: its engine (which owns the request) and the caller's sink.
pub(super) struct JobRecord {
    pub(super) engine: Arc<FetchEngine>,
    pub(super) sink: Arc<dyn ProgressSink>,
}

/// Bookkeeping for one job id.
///
/// A job is `Live` exactly while its status is non-terminal. Once it
/// settles, the engine and the caller's sink are dropped and only the
/// request survives for [`SchedulerState::take_retry`].
enum JobEntry {
    Live(JobRecord),
    Settled {
        request: DownloadRequest,
        retried: bool,
    },
}

impl JobEntry {
    fn url(&self) -> &str {
        match self {
            Self::Live(record) => &record.engine.request().url,
            Self::Settled { request, .. } => &request.url,
        }
    }

    fn live(&self) -> Option<&JobRecord> {
        match self {
            Self::Live(record) => Some(record),
            Self::Settled { .. } => None,
        }
    }
}

/// What the dispatcher should do next.
pub(super) enum Admission {
    /// A slot was reserved for this engine.
    Run(Arc<FetchEngine>),
    /// The head of the queue was already cancelled; notify and move on.
    Skip(DownloadProgress, Arc<dyn ProgressSink>),
    /// Nothing can be admitted right now.
    Idle,
    /// The manager is shutting down.
    Stop,
}

/// Result of a cancel request.
pub(super) enum CancelOutcome {
    /// No such job.
    Unknown,
    /// The job already reached a terminal status.
    Terminal,
    /// The job was still queued and has been removed.
    Dequeued(DownloadProgress, Arc<dyn ProgressSink>),
    /// The job holds a slot; its engine must be signalled.
    Running(Arc<FetchEngine>),
}

/// Mutable scheduler state.
pub(super) struct SchedulerState {
    queue: VecDeque<JobId>,
    active: usize,
    max_concurrent: usize,
    shutdown: bool,
    progress: HashMap<JobId, DownloadProgress>,
    jobs: HashMap<JobId, JobEntry>,
    by_url: HashMap<String, JobId>,
}

impl SchedulerState {
    pub(super) fn new(max_concurrent: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            active: 0,
            max_concurrent: clamp_concurrency(max_concurrent),
            shutdown: false,
            progress: HashMap::new(),
            jobs: HashMap::new(),
            by_url: HashMap::new(),
        }
    }

    pub(super) const fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    pub(super) const fn active(&self) -> usize {
        self.active
    }

    pub(super) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(super) const fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Store a new limit; returns the clamped value.
    pub(super) const fn set_max_concurrent(&mut self, n: usize) -> usize {
        self.max_concurrent = clamp_concurrency(n);
        self.max_concurrent
    }

    pub(super) fn contains(&self, id: &JobId) -> bool {
        self.jobs.contains_key(id)
    }

    /// Whether a non-terminal job already targets `url`.
    pub(super) fn is_duplicate(&self, url: &str) -> bool {
        self.by_url
            .get(url)
            .and_then(|id| self.progress.get(id))
            .is_some_and(|p| !p.is_terminal())
    }

    /// Record a new job at the back of the queue.
    pub(super) fn enqueue(&mut self, record: JobRecord) {
        let request = record.engine.request();
        let id = request.id.clone();
        self.by_url.insert(request.url.clone(), id.clone());
        self.progress
            .insert(id.clone(), DownloadProgress::queued(id.clone()));
        self.queue.push_back(id.clone());
        self.jobs.insert(id, JobEntry::Live(record));
    }

    /// Pop the queue head if a slot is free, reserving the slot.
    pub(super) fn next_admission(&mut self) -> Admission {
        if self.shutdown {
            return Admission::Stop;
        }
        if self.active >= self.max_concurrent {
            return Admission::Idle;
        }
        while let Some(id) = self.queue.pop_front() {
            let Some(engine) = self
                .jobs
                .get(&id)
                .and_then(JobEntry::live)
                .map(|record| Arc::clone(&record.engine))
            else {
                continue;
            };

            if engine.is_cancelled() {
                match self.mark_cancelled(&id) {
                    Some((snapshot, sink)) => return Admission::Skip(snapshot, sink),
                    // Already reported terminal.
                    None => continue,
                }
            }

            self.active += 1;
            return Admission::Run(engine);
        }
        Admission::Idle
    }

    /// Give a slot back.
    ///
    /// If the job never reported a terminal status (its task died), it is
    /// failed here and the snapshot is returned for delivery.
    pub(super) fn release(
        &mut self,
        id: &JobId,
    ) -> Option<(DownloadProgress, Arc<dyn ProgressSink>)> {
        self.active = self.active.saturating_sub(1);
        let progress = self.progress.get_mut(id)?;
        if progress.is_terminal() {
            return None;
        }
        progress.fail("download task stopped unexpectedly");
        let snapshot = progress.clone();
        let record = self.settle(id)?;
        Some((snapshot, record.sink))
    }

    /// Store a snapshot reported by an engine.
    ///
    /// Returns `false` when the job is unknown or already terminal, in which
    /// case the snapshot must not be forwarded.
    pub(super) fn record(&mut self, snapshot: &DownloadProgress) -> bool {
        let Some(current) = self.progress.get_mut(&snapshot.id) else {
            return false;
        };
        if current.is_terminal() {
            return false;
        }
        current.clone_from(snapshot);
        if snapshot.is_terminal() {
            self.settle(&snapshot.id);
        }
        true
    }

    pub(super) fn cancel(&mut self, id: &JobId) -> CancelOutcome {
        let Some(entry) = self.jobs.get(id) else {
            return CancelOutcome::Unknown;
        };
        let Some(engine) = entry.live().map(|record| Arc::clone(&record.engine)) else {
            return CancelOutcome::Terminal;
        };

        if let Some(pos) = self.queue.iter().position(|queued| queued == id) {
            self.queue.remove(pos);
            return self
                .mark_cancelled(id)
                .map_or(CancelOutcome::Terminal, |(snapshot, sink)| {
                    CancelOutcome::Dequeued(snapshot, sink)
                });
        }
        CancelOutcome::Running(engine)
    }

    /// Stop admitting work. Returns queued jobs' final snapshots and the
    /// engines that are still running.
    pub(super) fn begin_shutdown(
        &mut self,
    ) -> (
        Vec<(DownloadProgress, Arc<dyn ProgressSink>)>,
        Vec<Arc<FetchEngine>>,
    ) {
        self.shutdown = true;

        let queued: Vec<JobId> = self.queue.drain(..).collect();
        let dequeued: Vec<_> = queued
            .iter()
            .filter_map(|id| self.mark_cancelled(id))
            .collect();

        let running = self
            .jobs
            .values()
            .filter_map(JobEntry::live)
            .map(|record| Arc::clone(&record.engine))
            .collect();

        (dequeued, running)
    }

    pub(super) fn progress(&self, id: &JobId) -> Option<DownloadProgress> {
        self.progress.get(id).cloned()
    }

    pub(super) fn all_progress(&self) -> Vec<DownloadProgress> {
        self.progress.values().cloned().collect()
    }

    /// Claim a failed or cancelled job for resubmission.
    ///
    /// Returns its request under a fresh id. Each job can be claimed once.
    pub(super) fn take_retry(&mut self, id: &JobId) -> Option<DownloadRequest> {
        let status = self.progress.get(id)?.status;
        if !matches!(status, DownloadStatus::Error | DownloadStatus::Cancelled) {
            return None;
        }
        match self.jobs.get_mut(id)? {
            JobEntry::Settled { request, retried } if !*retried => {
                *retried = true;
                Some(request.renewed())
            }
            _ => None,
        }
    }

    fn mark_cancelled(
        &mut self,
        id: &JobId,
    ) -> Option<(DownloadProgress, Arc<dyn ProgressSink>)> {
        let progress = self.progress.get_mut(id)?;
        if progress.is_terminal() {
            return None;
        }
        progress.cancel();
        let snapshot = progress.clone();
        let record = self.settle(id)?;
        record.engine.cancel();
        Some((snapshot, record.sink))
    }

    /// Move a job that just turned terminal out of the live set.
    ///
    /// Forgets its URL mapping (only if it still points at `id`) and hands
    /// back the engine and sink so the caller decides what to drop.
    fn settle(&mut self, id: &JobId) -> Option<JobRecord> {
        let entry = self.jobs.get_mut(id)?;
        if self.by_url.get(entry.url()) == Some(id) {
            self.by_url.remove(entry.url());
        }
        let request = entry.live()?.engine.request().clone();
        let retired = JobEntry::Settled {
            request,
            retried: false,
        };
        match std::mem::replace(entry, retired) {
            JobEntry::Live(record) => Some(record),
            JobEntry::Settled { .. } => None,
        }
    }
}
