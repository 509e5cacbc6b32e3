//! Fetcher callbacks for one engine run.
//!
//! Translates [`FetchEvent`]s into updates of the job's progress snapshot and
//! decides which updates reach the sink.

use tokio_util::sync::CancellationToken;

use yoink_core::DownloadProgress;
use yoink_core::download::{
    DownloadError, DownloadStatus, FetchEvent, PostProcessPhase, TransferPhase,
};
use yoink_core::ports::{FetchHooks, ProgressSink};

use crate::progress::ProgressThrottle;

/// Hooks handed to the fetcher for the duration of a single run.
pub(super) struct EngineHooks<'a> {
    pub(super) progress: DownloadProgress,
    throttle: ProgressThrottle,
    sink: &'a dyn ProgressSink,
    cancel: &'a CancellationToken,
}

impl<'a> EngineHooks<'a> {
    pub(super) const fn new(
        progress: DownloadProgress,
        throttle: ProgressThrottle,
        sink: &'a dyn ProgressSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            progress,
            throttle,
            sink,
            cancel,
        }
    }

    /// Hand a copy of the snapshot to the sink if the throttle allows it.
    pub(super) fn emit(&mut self, force: bool) {
        if self.throttle.admit(force) {
            self.sink.on_progress(self.progress.clone());
        }
    }

    fn on_transfer(
        &mut self,
        phase: TransferPhase,
        downloaded: u64,
        total: u64,
        speed: Option<f64>,
        eta: Option<i64>,
    ) {
        match phase {
            TransferPhase::Downloading => {
                self.progress.advance(DownloadStatus::Downloading);
                self.progress.record_bytes(downloaded, total);
                self.progress.speed = speed.unwrap_or(0.0);
                self.progress.eta = eta;
                self.emit(false);
            }
            TransferPhase::Finished => {
                if total > 0 || downloaded > 0 {
                    self.progress.record_bytes(downloaded, total.max(downloaded));
                }
                self.progress.advance(DownloadStatus::Merging);
                self.progress.complete_percent();
                self.progress.speed = 0.0;
                self.progress.eta = None;
                self.emit(true);
            }
        }
    }
}

impl FetchHooks for EngineHooks<'_> {
    fn on_event(&mut self, event: FetchEvent) -> Result<(), DownloadError> {
        if self.cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let total = event.best_total().unwrap_or(0);
        match event {
            FetchEvent::Resolved { title } => {
                self.progress.title = title;
                self.emit(true);
            }
            FetchEvent::Transfer {
                phase,
                downloaded_bytes,
                speed,
                eta,
                filename,
                ..
            } => {
                if self.progress.title.is_empty() {
                    if let Some(stem) = filename.as_deref().and_then(|f| f.file_stem()) {
                        self.progress.title = stem.to_string_lossy().into_owned();
                    }
                }
                if phase == TransferPhase::Finished && self.progress.output_path.is_none() {
                    self.progress.output_path = filename;
                }
                self.on_transfer(phase, downloaded_bytes, total, speed, eta);
            }
            FetchEvent::PostProcessing { phase, output_path } => {
                if output_path.is_some() {
                    self.progress.output_path = output_path;
                }
                if phase == PostProcessPhase::Started {
                    self.progress.advance(DownloadStatus::Merging);
                    self.progress.complete_percent();
                }
                self.emit(phase == PostProcessPhase::Started);
            }
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
