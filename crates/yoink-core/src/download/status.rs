//! Download job lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a download job.
///
/// Lifecycle: `Queued → Downloading → (Merging) → {Finished | Error | Cancelled}`.
/// A queued job may also go straight to `Cancelled` or `Error`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Waiting for a concurrency slot.
    #[default]
    Queued,
    /// Transfer in progress.
    Downloading,
    /// Transfer done, post-processing (merge/convert) in progress.
    Merging,
    /// Completed successfully.
    Finished,
    /// Failed with an error.
    Error,
    /// Cancelled by the user.
    Cancelled,
}

impl DownloadStatus {
    /// String representation used in logs and serialized output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Merging => "merging",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// No further transition happens from a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Cancelled)
    }

    /// The job holds a concurrency slot in this status.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Downloading | Self::Merging)
    }

    /// Position in the lifecycle, used to keep transitions forward-only.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Downloading => 1,
            Self::Merging => 2,
            Self::Finished | Self::Error | Self::Cancelled => 3,
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(DownloadStatus::Finished.is_terminal());
        assert!(DownloadStatus::Error.is_terminal());
        assert!(DownloadStatus::Cancelled.is_terminal());
        assert!(!DownloadStatus::Queued.is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
        assert!(!DownloadStatus::Merging.is_terminal());
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&DownloadStatus::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
        assert_eq!(DownloadStatus::Merging.to_string(), "merging");
    }

    #[test]
    fn rank_is_forward_only() {
        assert!(DownloadStatus::Queued.rank() < DownloadStatus::Downloading.rank());
        assert!(DownloadStatus::Downloading.rank() < DownloadStatus::Merging.rank());
        assert!(DownloadStatus::Merging.rank() < DownloadStatus::Finished.rank());
    }
}
