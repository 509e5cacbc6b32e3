//! Per-job progress snapshot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::status::DownloadStatus;
use super::types::JobId;

/// Latest known state of one download job.
///
/// The scheduler owns one per job; the fetch engine writes it and observers
/// only ever receive clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Job this snapshot belongs to.
    pub id: JobId,
    /// Current lifecycle status.
    pub status: DownloadStatus,
    /// Display title, empty until metadata resolves.
    pub title: String,
    /// Bytes transferred so far.
    pub downloaded_bytes: u64,
    /// Best available estimate of the total size in bytes (0 if unknown).
    pub total_bytes: u64,
    /// Instantaneous transfer speed in bytes per second.
    pub speed: f64,
    /// Seconds remaining; absent or negative means unknown.
    pub eta: Option<i64>,
    /// Completion percentage in `[0, 100]`.
    pub percent: f64,
    /// Output file path once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Raw error text when status is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadProgress {
    /// Fresh snapshot for a job that has just been queued.
    #[must_use]
    pub fn queued(id: JobId) -> Self {
        Self {
            id,
            status: DownloadStatus::Queued,
            title: String::new(),
            downloaded_bytes: 0,
            total_bytes: 0,
            speed: 0.0,
            eta: None,
            percent: 0.0,
            output_path: None,
            error: None,
        }
    }

    /// Move to `status` if it lies ahead in the lifecycle.
    ///
    /// Returns `true` when the status changed. Backward moves and moves out
    /// of a terminal status are ignored.
    pub fn advance(&mut self, status: DownloadStatus) -> bool {
        if self.status.is_terminal() || status.rank() <= self.status.rank() {
            return false;
        }
        self.status = status;
        true
    }

    /// Record byte counters and derive the percentage from them.
    ///
    /// The percentage never decreases and stays within `[0, 100]`; when the
    /// total is unknown the previous value is kept.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_bytes(&mut self, downloaded: u64, total: u64) {
        self.downloaded_bytes = downloaded;
        self.total_bytes = total;
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
            self.percent = self.percent.max(pct);
        }
    }

    /// Pin the percentage to 100.
    pub fn complete_percent(&mut self) {
        self.percent = 100.0;
    }

    /// Terminal success.
    pub fn finish(&mut self) {
        self.status = DownloadStatus::Finished;
        self.percent = 100.0;
        self.eta = None;
    }

    /// Terminal failure with the raw error text.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = DownloadStatus::Error;
        self.error = Some(message.into());
    }

    /// Terminal cancellation.
    pub fn cancel(&mut self) {
        self.status = DownloadStatus::Cancelled;
    }

    /// Whether the job has reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Human-readable speed (e.g. `1.5 MB/s`), empty when not moving.
    #[must_use]
    pub fn speed_display(&self) -> String {
        if self.speed <= 0.0 {
            return String::new();
        }
        let mut speed = self.speed;
        for unit in ["B/s", "KB/s", "MB/s", "GB/s"] {
            if speed.abs() < 1024.0 {
                return format!("{speed:.1} {unit}");
            }
            speed /= 1024.0;
        }
        format!("{speed:.1} TB/s")
    }

    /// Human-readable ETA (e.g. `2m 5s`), empty when unknown.
    #[must_use]
    pub fn eta_display(&self) -> String {
        match self.eta {
            Some(eta) if eta >= 0 => {
                let (m, s) = (eta / 60, eta % 60);
                if m > 0 {
                    format!("{m}m {s}s")
                } else {
                    format!("{s}s")
                }
            }
            _ => String::new(),
        }
    }
}
