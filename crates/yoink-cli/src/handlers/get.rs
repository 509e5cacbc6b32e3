//! `yoink get`: expand playlists, queue every video and follow the batch
//! until each job settles.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use yoink_core::ports::{DownloadManagerPort, ProgressSink};
use yoink_core::{DownloadProgress, DownloadRequest, DownloadStatus, JobId, MediaInfo};

use crate::bootstrap::CliContext;
use crate::commands::GetArgs;
use crate::error::CliError;
use crate::presentation::JobBoard;

/// How a batch ended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Jobs that finished.
    pub finished: usize,
    /// Jobs that failed, plus URLs that could not be resolved.
    pub failed: usize,
    /// Jobs that were cancelled.
    pub cancelled: usize,
}

impl BatchReport {
    /// Everything that was attempted.
    pub const fn total(&self) -> usize {
        self.finished + self.failed + self.cancelled
    }

    fn record(&mut self, status: DownloadStatus) {
        match status {
            DownloadStatus::Finished => self.finished += 1,
            DownloadStatus::Cancelled => self.cancelled += 1,
            _ => self.failed += 1,
        }
    }
}

/// Execute the get command; Ctrl-C cancels the whole batch.
pub async fn execute(ctx: &CliContext, args: &GetArgs) -> Result<(), CliError> {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let report = run(ctx.manager(), args, interrupt).await;

    let unfinished = report.failed + report.cancelled;
    if unfinished > 0 {
        return Err(CliError::Incomplete {
            failed: unfinished,
            total: report.total(),
        });
    }
    println!("Done! {} downloaded.", report.finished);
    Ok(())
}

/// Queue every video behind `args.urls` and wait for all of them.
///
/// When `interrupt` completes the manager is shut down, which cancels the
/// rest of the batch.
pub async fn run(
    manager: &dyn DownloadManagerPort,
    args: &GetArgs,
    interrupt: impl Future<Output = ()>,
) -> BatchReport {
    let mut board = JobBoard::new();
    let mut report = BatchReport::default();

    let (tx, mut rx) = mpsc::unbounded_channel::<DownloadProgress>();
    let sink: Arc<dyn ProgressSink> = Arc::new(move |progress: DownloadProgress| {
        // The receiver only goes away once the batch is over.
        let _ = tx.send(progress);
    });

    let jobs = expand(manager, &args.urls, &board, &mut report).await;
    let mut pending: HashSet<JobId> = HashSet::new();
    for (url, title) in jobs {
        match manager.submit(build_request(&url, args), Arc::clone(&sink), false) {
            Some(id) => {
                board.add(&id, &title);
                pending.insert(id);
            }
            None => board.println(&format!("- {url}: already queued, skipped")),
        }
    }
    drop(sink);

    tokio::pin!(interrupt);
    let mut interrupted = false;
    while !pending.is_empty() {
        tokio::select! {
            Some(progress) = rx.recv() => {
                board.update(&progress);
                if progress.is_terminal() && pending.remove(&progress.id) {
                    report.record(progress.status);
                    board.finish(&progress);
                }
            }
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                board.println("Interrupted, cancelling downloads...");
                manager.shutdown();
            }
            else => break,
        }
    }
    report
}

/// Resolve each URL, turning playlists into their entries.
///
/// URLs that cannot be resolved are reported and counted as failures.
async fn expand(
    manager: &dyn DownloadManagerPort,
    urls: &[String],
    board: &JobBoard,
    report: &mut BatchReport,
) -> Vec<(String, String)> {
    let mut jobs = Vec::new();
    for url in urls {
        match manager.resolve_metadata(url).await {
            Ok(MediaInfo::Video(video)) => jobs.push((url.clone(), video.title)),
            Ok(MediaInfo::Playlist(playlist)) => {
                let entries: Vec<_> = playlist
                    .videos
                    .into_iter()
                    .filter(|video| !video.url.is_empty())
                    .map(|video| (video.url, video.title))
                    .collect();
                tracing::info!(url = %url, entries = entries.len(), "Expanded playlist");
                if entries.is_empty() {
                    board.println(&format!("- {}: playlist is empty", playlist.title));
                }
                jobs.extend(entries);
            }
            Err(e) => {
                report.failed += 1;
                board.println(&format!("✗ {url}: {}", e.user_message()));
            }
        }
    }
    jobs
}

/// Turn command-line options into a request for one video.
pub fn build_request(url: &str, args: &GetArgs) -> DownloadRequest {
    let mut request = DownloadRequest::new(url)
        .with_audio_only(args.audio_only)
        .with_speed_limit(args.limit_rate);
    if let Some(format) = &args.format {
        request = request.with_format(format);
    } else if let Some(quality) = args.quality {
        request = request.with_format(quality.selector());
    }
    if let Some(dir) = &args.output_dir {
        request = request.with_output_dir(dir);
    }
    if let Some(template) = &args.template {
        request = request.with_output_template(template);
    }
    if let Some(language) = &args.subs {
        request = request.with_subtitles(language);
    }
    request
}
