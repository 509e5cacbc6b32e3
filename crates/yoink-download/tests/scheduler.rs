//! Scheduler behaviour: admission order, concurrency limit, deduplication,
//! cancellation, retry and shutdown.
//!
//! Jobs run against [`GatedFetcher`], which holds every transfer open until
//! the test releases its URL, so the interleavings below are deterministic.

mod common;

use std::sync::Arc;
use std::time::Duration;

use yoink_core::ports::{DownloadManagerPort, ProgressSink};
use yoink_core::{DownloadError, DownloadStatus, MediaInfo, PlaylistInfo};

use common::{
    GatedFetcher, MockMetadata, RecordingSink, manager, manager_with_metadata, request,
    wait_for_status, wait_until,
};

fn sink(recording: &Arc<RecordingSink>) -> Arc<dyn ProgressSink> {
    Arc::clone(recording) as Arc<dyn ProgressSink>
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_jobs_limit_two_admitted_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(2, fetcher.clone());
    let recording = RecordingSink::new();

    let urls: Vec<String> = (1..=5).map(|i| format!("https://example.com/{i}")).collect();
    let ids: Vec<_> = urls
        .iter()
        .map(|u| manager.submit(request(u, dir.path()), sink(&recording), false).unwrap())
        .collect();

    wait_until("two jobs to start", || fetcher.started().len() == 2).await;
    wait_for_status(&manager, &ids[0], DownloadStatus::Downloading).await;
    wait_for_status(&manager, &ids[1], DownloadStatus::Downloading).await;
    // Both slots open together, so the two workers may reach the fetcher in
    // either order.
    let mut first_two = fetcher.started();
    first_two.sort();
    assert_eq!(first_two, urls[..2].to_vec());
    for id in &ids[2..] {
        assert_eq!(manager.progress(id).unwrap().status, DownloadStatus::Queued);
    }
    assert_eq!(manager.active_count(), 2);
    assert_eq!(manager.pending_count(), 3);

    fetcher.release(&urls[0]);
    wait_for_status(&manager, &ids[0], DownloadStatus::Finished).await;
    wait_until("third job to start", || fetcher.started().len() == 3).await;
    assert_eq!(fetcher.started()[2], urls[2]);
    assert_eq!(manager.progress(&ids[3]).unwrap().status, DownloadStatus::Queued);

    // Free one slot at a time so each admission is observable in turn.
    for (next, url) in urls[1..3].iter().enumerate() {
        fetcher.release(url);
        let started = next + 4;
        wait_until("next job to start", || fetcher.started().len() == started).await;
        assert_eq!(fetcher.started()[started - 1], urls[started - 1]);
    }
    for url in &urls[3..] {
        fetcher.release(url);
    }
    for id in &ids {
        wait_for_status(&manager, id, DownloadStatus::Finished).await;
    }
    assert_eq!(fetcher.started()[2..], urls[2..]);
    assert!(fetcher.peak() <= 2, "peak was {}", fetcher.peak());
    wait_until("slots to drain", || manager.active_count() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finished_job_reports_full_percent() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(3, fetcher.clone());
    let recording = RecordingSink::new();

    let id = manager
        .submit(request("https://example.com/a", dir.path()), sink(&recording), false)
        .unwrap();
    fetcher.release("https://example.com/a");
    wait_for_status(&manager, &id, DownloadStatus::Finished).await;

    let last = manager.progress(&id).unwrap();
    assert!((last.percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(last.title, "title of https://example.com/a");
    assert_eq!(last.output_path, Some(dir.path().join("out.mp4")));
    assert_eq!(recording.last(&id), Some(last));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_url_rejected_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(3, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/dup";

    let first = manager.submit(request(url, dir.path()), sink(&recording), false);
    assert!(first.is_some());
    assert!(manager.submit(request(url, dir.path()), sink(&recording), false).is_none());

    let forced = manager.submit(request(url, dir.path()), sink(&recording), true);
    assert!(forced.is_some());
    assert_ne!(first, forced);
    assert_eq!(manager.all_progress().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn url_accepted_again_after_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(3, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/again";

    let first = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    fetcher.release(url);
    wait_for_status(&manager, &first, DownloadStatus::Finished).await;

    let second = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_queued_job_never_runs() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(1, fetcher.clone());
    let recording = RecordingSink::new();

    let a = manager
        .submit(request("https://example.com/a", dir.path()), sink(&recording), false)
        .unwrap();
    let b = manager
        .submit(request("https://example.com/b", dir.path()), sink(&recording), false)
        .unwrap();
    wait_until("first job to start", || fetcher.started().len() == 1).await;

    assert!(manager.cancel(&b));
    // Queued cancellation is synchronous.
    assert_eq!(manager.progress(&b).unwrap().status, DownloadStatus::Cancelled);
    assert_eq!(recording.statuses(&b), vec![DownloadStatus::Cancelled]);
    assert_eq!(manager.pending_count(), 0);
    assert!(!manager.cancel(&b));

    fetcher.release("https://example.com/a");
    wait_for_status(&manager, &a, DownloadStatus::Finished).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.started(), vec!["https://example.com/a".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_running_job_frees_its_slot() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(1, fetcher.clone());
    let recording = RecordingSink::new();

    let a = manager
        .submit(request("https://example.com/a", dir.path()), sink(&recording), false)
        .unwrap();
    let b = manager
        .submit(request("https://example.com/b", dir.path()), sink(&recording), false)
        .unwrap();
    wait_for_status(&manager, &a, DownloadStatus::Downloading).await;

    assert!(manager.cancel(&a));
    wait_for_status(&manager, &a, DownloadStatus::Cancelled).await;
    wait_until("second job to start", || fetcher.started().len() == 2).await;
    wait_until("fetcher to drop cancelled job", || fetcher.running() == 1).await;

    fetcher.release("https://example.com/b");
    wait_for_status(&manager, &b, DownloadStatus::Finished).await;
    assert_eq!(recording.last(&a).unwrap().status, DownloadStatus::Cancelled);
}

#[tokio::test]
async fn cancel_unknown_job_is_false() {
    let manager = manager(1, GatedFetcher::new());
    assert!(!manager.cancel(&"nope".into()));
    assert!(manager.progress(&"nope".into()).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn raising_limit_admits_waiting_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(1, fetcher.clone());
    let recording = RecordingSink::new();

    for i in 0..3 {
        manager
            .submit(
                request(&format!("https://example.com/{i}"), dir.path()),
                sink(&recording),
                false,
            )
            .unwrap();
    }
    wait_until("one job to start", || fetcher.started().len() == 1).await;

    manager.set_max_concurrent(3);
    assert_eq!(manager.max_concurrent(), 3);
    wait_until("all jobs to start", || fetcher.started().len() == 3).await;
    assert_eq!(manager.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lowering_limit_keeps_running_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(2, fetcher.clone());
    let recording = RecordingSink::new();
    let urls: Vec<String> = (0..4).map(|i| format!("https://example.com/{i}")).collect();

    let ids: Vec<_> = urls
        .iter()
        .map(|u| manager.submit(request(u, dir.path()), sink(&recording), false).unwrap())
        .collect();
    wait_until("two jobs to start", || fetcher.started().len() == 2).await;

    manager.set_max_concurrent(1);
    assert_eq!(manager.active_count(), 2);
    assert_eq!(fetcher.running(), 2);

    // One slot frees up, but the new limit is already met.
    fetcher.release(&urls[0]);
    wait_for_status(&manager, &ids[0], DownloadStatus::Finished).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.started().len(), 2);

    fetcher.release(&urls[1]);
    wait_until("third job to start", || fetcher.started().len() == 3).await;
    assert_eq!(fetcher.started()[2], urls[2]);
}

#[tokio::test]
async fn limit_is_clamped() {
    let manager = manager(0, GatedFetcher::new());
    assert_eq!(manager.max_concurrent(), 1);
    manager.set_max_concurrent(99);
    assert_eq!(manager.max_concurrent(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rate_limit_error_is_surfaced_raw() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(2, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/limited";
    let raw = "ERROR: [youtube] limited: HTTP Error 429: Too Many Requests";

    fetcher.fail_with(url, raw);
    let id = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    fetcher.release(url);
    wait_for_status(&manager, &id, DownloadStatus::Error).await;

    let last = manager.progress(&id).unwrap();
    assert_eq!(last.error.as_deref(), Some(raw));
    assert!(yoink_core::friendly_message(raw).contains("Rate limited"));
    // The failed job no longer blocks its URL.
    assert!(
        manager
            .submit(request(url, dir.path()), sink(&recording), false)
            .is_some()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn retry_resubmits_failed_job_under_new_id() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(2, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/flaky";

    fetcher.fail_with(url, "Read timed out");
    let id = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    assert!(
        manager.retry(&id, sink(&recording)).is_none(),
        "running jobs are not retryable"
    );
    fetcher.release(url);
    wait_for_status(&manager, &id, DownloadStatus::Error).await;

    let retried = manager.retry(&id, sink(&recording)).unwrap();
    assert_ne!(retried, id);
    wait_until("retry to start", || fetcher.started().len() == 2).await;
    assert!(recording.for_job(&retried).iter().all(|p| p.id == retried));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn second_retry_of_same_job_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(3, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/flaky";

    fetcher.fail_with(url, "Read timed out");
    let id = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    fetcher.release(url);
    wait_for_status(&manager, &id, DownloadStatus::Error).await;

    let first = manager.retry(&id, sink(&recording));
    let second = manager.retry(&id, sink(&recording));
    assert!(first.is_some());
    assert!(second.is_none());
    wait_until("retry to start", || fetcher.started().len() == 2).await;
    assert_eq!(manager.active_count(), 1);
    assert_eq!(manager.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finished_job_releases_caller_sink() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(2, fetcher.clone());
    let recording = RecordingSink::new();
    let url = "https://example.com/once";

    let id = manager
        .submit(request(url, dir.path()), sink(&recording), false)
        .unwrap();
    wait_until("job to start", || fetcher.started().len() == 1).await;
    assert!(Arc::strong_count(&recording) > 1);

    fetcher.release(url);
    wait_for_status(&manager, &id, DownloadStatus::Finished).await;
    wait_until("sink to be released", || Arc::strong_count(&recording) == 1).await;
    assert_eq!(manager.progress(&id).unwrap().status, DownloadStatus::Finished);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shutdown_cancels_everything_and_rejects_new_work() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = GatedFetcher::new();
    let manager = manager(1, fetcher.clone());
    let recording = RecordingSink::new();

    let a = manager
        .submit(request("https://example.com/a", dir.path()), sink(&recording), false)
        .unwrap();
    let b = manager
        .submit(request("https://example.com/b", dir.path()), sink(&recording), false)
        .unwrap();
    wait_for_status(&manager, &a, DownloadStatus::Downloading).await;

    manager.shutdown();
    assert_eq!(manager.progress(&b).unwrap().status, DownloadStatus::Cancelled);
    wait_for_status(&manager, &a, DownloadStatus::Cancelled).await;
    assert!(
        manager
            .submit(request("https://example.com/c", dir.path()), sink(&recording), false)
            .is_none()
    );
    // Idempotent.
    manager.shutdown();
    wait_until("slots to drain", || manager.active_count() == 0).await;
}

#[tokio::test]
async fn metadata_lookups_pass_through() {
    let mut metadata = MockMetadata::new();
    metadata.expect_fetch().returning(|url| {
        if url.contains("list=") {
            Ok(MediaInfo::Playlist(PlaylistInfo {
                title: "Mix".to_string(),
                ..Default::default()
            }))
        } else {
            Err(DownloadError::other("ERROR: Unsupported URL: ftp://x"))
        }
    });
    let manager = manager_with_metadata(1, GatedFetcher::new(), Arc::new(metadata));
    let port: &dyn DownloadManagerPort = &manager;

    assert!(port.is_collection("https://example.com/?list=1").await.unwrap());
    assert_eq!(
        port.resolve_metadata("https://example.com/?list=1")
            .await
            .unwrap()
            .title(),
        "Mix"
    );
    assert!(port.formats("https://example.com/?list=1").await.unwrap().is_empty());

    let err = port.resolve_metadata("ftp://x").await.unwrap_err();
    assert!(err.user_message().starts_with("Unsupported URL"));
}
