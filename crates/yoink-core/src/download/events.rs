//! Events a fetcher reports while retrieving one request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Phase of a transfer progress report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferPhase {
    /// Bytes are still arriving.
    Downloading,
    /// One stream finished transferring.
    Finished,
}

/// Phase of a post-processing step (merge, audio extraction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessPhase {
    /// A post-processor started.
    Started,
    /// A post-processor finished.
    Finished,
}

/// Callback payload emitted by a fetcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchEvent {
    /// Metadata for the request resolved.
    Resolved {
        /// Display title of the video.
        title: String,
    },

    /// Transfer progress for one stream.
    Transfer {
        /// Whether the stream is still transferring.
        phase: TransferPhase,
        /// Bytes received so far for this stream.
        downloaded_bytes: u64,
        /// Exact size of the stream, when the server reports it.
        total_bytes: Option<u64>,
        /// Estimated size, used when the exact size is missing.
        total_bytes_estimate: Option<u64>,
        /// Current speed in bytes per second.
        speed: Option<f64>,
        /// Seconds remaining.
        eta: Option<i64>,
        /// File the stream is written to.
        filename: Option<PathBuf>,
    },

    /// Post-processing progress.
    PostProcessing {
        /// Start or end of the step.
        phase: PostProcessPhase,
        /// Final file path, when the step reports one.
        output_path: Option<PathBuf>,
    },
}

impl FetchEvent {
    /// Best available total size for a transfer event.
    #[must_use]
    pub fn best_total(&self) -> Option<u64> {
        match self {
            Self::Transfer {
                total_bytes,
                total_bytes_estimate,
                ..
            } => total_bytes.or(*total_bytes_estimate),
            _ => None,
        }
    }
}

/// What a fetcher reports on success.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Final output file, when known.
    pub output_path: Option<PathBuf>,
}
