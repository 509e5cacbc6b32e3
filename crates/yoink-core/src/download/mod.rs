//! Download domain types, events, errors, and traits.
//!
//! This module contains pure data types for the download system. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Job identifiers and requests (`JobId`, `DownloadRequest`)
//! - `status` - The job lifecycle (`DownloadStatus`)
//! - `progress` - Per-job progress snapshots (`DownloadProgress`)
//! - `events` - Fetcher-boundary events (`FetchEvent`, `FetchOutcome`)
//! - `errors` - Error type for download operations
//! - `friendly` - Raw error text to user-facing message lookup

pub mod errors;
pub mod events;
pub mod friendly;
pub mod progress;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use errors::{DownloadError, DownloadResult};
pub use events::{FetchEvent, FetchOutcome, PostProcessPhase, TransferPhase};
pub use friendly::friendly_message;
pub use progress::DownloadProgress;
pub use status::DownloadStatus;
pub use types::{
    DEFAULT_FORMAT, DEFAULT_OUTPUT_TEMPLATE, DEFAULT_SUBTITLE_LANGUAGE, DownloadRequest, JobId,
    SubtitleOptions, default_output_dir,
};
