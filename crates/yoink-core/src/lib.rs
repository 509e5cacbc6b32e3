//! Core domain types and port definitions for yoink.
//!
//! This crate holds everything the download orchestration layer agrees on
//! without doing any I/O itself:
//!
//! - `download` - job identifiers, requests, status, progress snapshots,
//!   fetch events and the error type
//! - `media` - read-only metadata snapshots (videos, playlists, formats)
//! - `ports` - traits for the fetcher, the metadata source, progress sinks
//!   and the download manager facade
#![deny(unused_crate_dependencies)]

pub mod download;
pub mod media;
pub mod ports;

// Re-export commonly used types for convenience
pub use download::{
    DownloadError, DownloadProgress, DownloadRequest, DownloadResult, DownloadStatus, FetchEvent,
    FetchOutcome, JobId, PostProcessPhase, SubtitleOptions, TransferPhase, friendly_message,
};
pub use media::{
    FormatOption, MediaInfo, PlaylistInfo, QualityPreset, VideoInfo, curate_formats, human_size,
};
pub use ports::{
    DEFAULT_CONCURRENT, DownloadManagerConfig, DownloadManagerPort, FetchHooks, FetcherPort,
    MAX_CONCURRENT, MIN_CONCURRENT, MetadataPort, NoopProgressSink, ProgressSink,
    clamp_concurrency,
};

#[cfg(test)]
use serde_json as _;
