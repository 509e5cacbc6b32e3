//! Fetch Engine behaviour against scripted fetchers.

mod common;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use yoink_core::ports::{FetchHooks, FetcherPort, ProgressSink};
use yoink_core::{
    DownloadError, DownloadRequest, DownloadStatus, FetchEvent, FetchOutcome, PostProcessPhase,
    TransferPhase,
};
use yoink_download::FetchEngine;

use common::{EndlessFetcher, RecordingSink, ScriptedFetcher, request, transfer};

const LONG: Duration = Duration::from_secs(3600);

fn engine(
    request: DownloadRequest,
    fetcher: Arc<dyn FetcherPort>,
    sink: &Arc<RecordingSink>,
    interval: Duration,
) -> FetchEngine {
    let sink: Arc<dyn ProgressSink> = Arc::clone(sink) as Arc<dyn ProgressSink>;
    FetchEngine::new(request, fetcher, sink, interval)
}

#[tokio::test]
async fn success_pins_percent_and_records_output() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(
        vec![
            FetchEvent::Resolved {
                title: "Clip".to_string(),
            },
            transfer(TransferPhase::Downloading, 400, 1_000),
            transfer(TransferPhase::Finished, 1_000, 1_000),
        ],
        Ok(FetchOutcome {
            output_path: Some(PathBuf::from("/out/Clip.mp4")),
        }),
    );
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher, &sink, LONG);

    let last = engine.run().await;

    assert_eq!(last.status, DownloadStatus::Finished);
    assert!((last.percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(last.title, "Clip");
    assert_eq!(last.output_path, Some(PathBuf::from("/out/Clip.mp4")));
    assert_eq!(sink.last(engine.id()), Some(last));
}

#[tokio::test]
async fn throttle_drops_ticks_but_never_transitions() {
    let dir = tempfile::tempdir().unwrap();
    let mut events: Vec<FetchEvent> = (1..=50)
        .map(|i| transfer(TransferPhase::Downloading, i * 10, 1_000))
        .collect();
    events.push(transfer(TransferPhase::Finished, 1_000, 1_000));
    let fetcher = ScriptedFetcher::new(events, Ok(FetchOutcome::default()));
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher, &sink, LONG);

    engine.run().await;

    // Start of transfer, the merge transition and the terminal snapshot.
    assert_eq!(
        sink.statuses(engine.id()),
        vec![
            DownloadStatus::Downloading,
            DownloadStatus::Merging,
            DownloadStatus::Finished
        ]
    );
}

#[tokio::test]
async fn unthrottled_ticks_are_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(
        vec![
            transfer(TransferPhase::Downloading, 600, 1_000),
            // A second stream restarts its byte counter.
            transfer(TransferPhase::Downloading, 100, 1_000),
            transfer(TransferPhase::Downloading, 700, 1_000),
        ],
        Ok(FetchOutcome::default()),
    );
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher, &sink, Duration::ZERO);

    engine.run().await;

    let percents: Vec<f64> = sink.for_job(engine.id()).iter().map(|p| p.percent).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
}

#[tokio::test]
async fn status_does_not_move_backwards() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(
        vec![
            transfer(TransferPhase::Finished, 1_000, 1_000),
            transfer(TransferPhase::Downloading, 10, 500),
            FetchEvent::PostProcessing {
                phase: PostProcessPhase::Started,
                output_path: None,
            },
        ],
        Ok(FetchOutcome::default()),
    );
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher, &sink, Duration::ZERO);

    engine.run().await;

    let statuses = sink.statuses(engine.id());
    let first_merge = statuses
        .iter()
        .position(|s| *s == DownloadStatus::Merging)
        .unwrap();
    assert!(
        statuses[first_merge..]
            .iter()
            .all(|s| *s != DownloadStatus::Downloading)
    );
}

#[tokio::test]
async fn fetch_error_text_is_kept_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let raw = "ERROR: [youtube] abc: HTTP Error 429: Too Many Requests";
    let fetcher = ScriptedFetcher::new(vec![], Err(DownloadError::other(raw)));
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher, &sink, LONG);

    let last = engine.run().await;

    assert_eq!(last.status, DownloadStatus::Error);
    assert_eq!(last.error.as_deref(), Some(raw));
}

#[tokio::test]
async fn cancelled_before_start_skips_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(vec![], Ok(FetchOutcome::default()));
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher.clone(), &sink, LONG);

    engine.cancel();
    let last = engine.run().await;

    assert_eq!(last.status, DownloadStatus::Cancelled);
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(sink.statuses(engine.id()), vec![DownloadStatus::Cancelled]);
}

#[tokio::test]
async fn unwritable_output_dir_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let fetcher = ScriptedFetcher::new(vec![], Ok(FetchOutcome::default()));
    let sink = RecordingSink::new();
    let engine = engine(
        request("u", &blocker.join("nested")),
        fetcher.clone(),
        &sink,
        LONG,
    );

    let last = engine.run().await;

    assert_eq!(last.status, DownloadStatus::Error);
    assert!(last.error.is_some());
    assert_eq!(fetcher.calls(), 0);
}

/// Cancels its own engine mid-run and records what the next callback said.
struct SelfCancellingFetcher {
    token: OnceLock<CancellationToken>,
    observed: OnceLock<DownloadError>,
}

#[async_trait]
impl FetcherPort for SelfCancellingFetcher {
    async fn fetch(
        &self,
        _request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        hooks.on_event(transfer(TransferPhase::Downloading, 1, 10))?;
        if let Some(token) = self.token.get() {
            token.cancel();
        }
        assert!(hooks.is_cancelled());
        let err = hooks
            .on_event(transfer(TransferPhase::Downloading, 2, 10))
            .unwrap_err();
        let _ = self.observed.set(err.clone());
        Err(err)
    }
}

#[tokio::test]
async fn callbacks_report_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(SelfCancellingFetcher {
        token: OnceLock::new(),
        observed: OnceLock::new(),
    });
    let sink = RecordingSink::new();
    let engine = engine(request("u", dir.path()), fetcher.clone(), &sink, LONG);
    fetcher.token.set(engine.cancel_token()).unwrap();

    let last = engine.run().await;

    assert_eq!(last.status, DownloadStatus::Cancelled);
    assert_eq!(fetcher.observed.get(), Some(&DownloadError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_from_another_task_stops_a_busy_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = EndlessFetcher::new();
    let sink = RecordingSink::new();
    let engine = Arc::new(engine(
        request("u", dir.path()),
        fetcher.clone(),
        &sink,
        Duration::from_millis(10),
    ));

    let running = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.run().await }
    });
    common::wait_until("first ticks", || {
        fetcher.ticks.load(std::sync::atomic::Ordering::SeqCst) > 5
    })
    .await;
    engine.cancel();

    let last = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("engine did not stop")
        .unwrap();
    assert_eq!(last.status, DownloadStatus::Cancelled);
    assert!(engine.is_cancelled());
}
