//! Download orchestration for yoink.
//!
//! - `engine` - the Fetch Engine: one request, progress mapping,
//!   throttling, cooperative cancellation
//! - `manager` - the scheduler: bounded FIFO admission, URL deduplication,
//!   runtime-adjustable concurrency, retry and shutdown
//! - `progress` - the progress throttle
//! - `ytdlp` - the `yt-dlp` subprocess adapter implementing the fetcher and
//!   metadata ports

// Re-export core types for convenience
pub use yoink_core::download::{
    DownloadError, DownloadProgress, DownloadRequest, DownloadStatus, FetchEvent, FetchOutcome,
    JobId,
};
pub use yoink_core::ports::{
    DownloadManagerConfig, DownloadManagerPort, FetchHooks, FetcherPort, MetadataPort,
    NoopProgressSink, ProgressSink,
};

mod engine;
mod manager;
pub(crate) mod progress;
pub mod ytdlp;

pub use engine::FetchEngine;
pub use manager::{DownloadManager, DownloadManagerDeps};
pub use progress::ProgressThrottle;
pub use ytdlp::{YtDlp, YtDlpConfig};
