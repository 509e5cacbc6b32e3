//! Shared fakes for the download crate's integration tests.
//!
//! No network or yt-dlp is needed: fetchers here are scripted and driven
//! from the test body.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::Notify;

use yoink_core::ports::{
    DownloadManagerConfig, FetchHooks, FetcherPort, MetadataPort, ProgressSink,
};
use yoink_core::{
    DownloadError, DownloadProgress, DownloadRequest, DownloadStatus, FetchEvent, FetchOutcome,
    JobId, MediaInfo, TransferPhase,
};
use yoink_download::{DownloadManager, DownloadManagerDeps};

// ── Metadata ───────────────────────────────────────────────────────

mock! {
    pub Metadata {}

    #[async_trait]
    impl MetadataPort for Metadata {
        async fn fetch(&self, url: &str) -> Result<MediaInfo, DownloadError>;
    }
}

// ── Sinks ──────────────────────────────────────────────────────────

/// Records every snapshot it receives.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<DownloadProgress>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<DownloadProgress> {
        self.seen.lock().unwrap().clone()
    }

    pub fn for_job(&self, id: &JobId) -> Vec<DownloadProgress> {
        self.all().into_iter().filter(|p| &p.id == id).collect()
    }

    pub fn statuses(&self, id: &JobId) -> Vec<DownloadStatus> {
        self.for_job(id).iter().map(|p| p.status).collect()
    }

    pub fn last(&self, id: &JobId) -> Option<DownloadProgress> {
        self.for_job(id).pop()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, progress: DownloadProgress) {
        self.seen.lock().unwrap().push(progress);
    }
}

// ── Fetchers ───────────────────────────────────────────────────────

/// Replays a fixed list of events, then returns a fixed result.
pub struct ScriptedFetcher {
    events: Vec<FetchEvent>,
    result: Result<FetchOutcome, DownloadError>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(events: Vec<FetchEvent>, result: Result<FetchOutcome, DownloadError>) -> Arc<Self> {
        Arc::new(Self {
            events,
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetcherPort for ScriptedFetcher {
    async fn fetch(
        &self,
        _request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for event in &self.events {
            hooks.on_event(event.clone())?;
        }
        self.result.clone()
    }
}

/// Keeps emitting progress until cancelled through its hooks.
pub struct EndlessFetcher {
    pub ticks: AtomicUsize,
}

impl EndlessFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ticks: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FetcherPort for EndlessFetcher {
    async fn fetch(
        &self,
        _request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        let mut downloaded = 0;
        loop {
            downloaded += 10;
            hooks.on_event(transfer(TransferPhase::Downloading, downloaded, 1_000_000))?;
            self.ticks.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
        }
    }
}

/// Blocks each job until the test releases its URL.
#[derive(Default)]
pub struct GatedFetcher {
    started: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failures: Mutex<HashMap<String, String>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GatedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn gate(&self, url: &str) -> Arc<Notify> {
        Arc::clone(
            self.gates
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }

    /// Let the (current or next) job for `url` complete.
    pub fn release(&self, url: &str) {
        self.gate(url).notify_one();
    }

    /// Make jobs for `url` fail with `message` once released.
    pub fn fail_with(&self, url: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(url.to_string(), message.to_string());
    }

    /// URLs in the order their jobs started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetcherPort for GatedFetcher {
    async fn fetch(
        &self,
        request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        let _running = RunningGuard(&self.running);
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.started.lock().unwrap().push(request.url.clone());

        hooks.on_event(FetchEvent::Resolved {
            title: format!("title of {}", request.url),
        })?;
        hooks.on_event(transfer(TransferPhase::Downloading, 250, 1_000))?;

        self.gate(&request.url).notified().await;

        if let Some(message) = self.failures.lock().unwrap().get(&request.url).cloned() {
            return Err(DownloadError::other(message));
        }

        hooks.on_event(transfer(TransferPhase::Finished, 1_000, 1_000))?;
        Ok(FetchOutcome {
            output_path: Some(request.output_dir.join("out.mp4")),
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────────

pub fn transfer(phase: TransferPhase, downloaded: u64, total: u64) -> FetchEvent {
    FetchEvent::Transfer {
        phase,
        downloaded_bytes: downloaded,
        total_bytes: Some(total),
        total_bytes_estimate: None,
        speed: Some(1024.0),
        eta: Some(3),
        filename: None,
    }
}

pub fn request(url: &str, dir: &std::path::Path) -> DownloadRequest {
    DownloadRequest::new(url).with_output_dir(dir)
}

pub fn manager(max_concurrent: usize, fetcher: Arc<dyn FetcherPort>) -> DownloadManager {
    manager_with_metadata(max_concurrent, fetcher, Arc::new(MockMetadata::new()))
}

pub fn manager_with_metadata(
    max_concurrent: usize,
    fetcher: Arc<dyn FetcherPort>,
    metadata: Arc<dyn MetadataPort>,
) -> DownloadManager {
    DownloadManager::new(
        DownloadManagerConfig::default()
            .with_max_concurrent(max_concurrent)
            .with_progress_interval(Duration::from_millis(10)),
        DownloadManagerDeps { fetcher, metadata },
    )
}

/// Poll `condition` until it holds, failing the test after five seconds.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until the manager reports `status` for `id`.
pub async fn wait_for_status(manager: &DownloadManager, id: &JobId, status: DownloadStatus) {
    wait_until(&format!("{id} to reach {status}"), || {
        manager.progress(id).is_some_and(|p| p.status == status)
    })
    .await;
}
