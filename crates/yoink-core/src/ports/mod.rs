//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the orchestration layer expects from its
//! collaborators. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No process, subprocess-protocol or runtime types in any signature
//! - Progress observers receive owned snapshots, never shared state
//! - Cancellation crosses the fetcher boundary as [`FetchHooks`], not as a
//!   runtime-specific token

pub mod download_manager;
pub mod fetcher;
pub mod metadata;
pub mod progress_sink;

pub use download_manager::{
    DEFAULT_CONCURRENT, DownloadManagerConfig, DownloadManagerPort, MAX_CONCURRENT,
    MIN_CONCURRENT, clamp_concurrency,
};
pub use fetcher::{FetchHooks, FetcherPort};
pub use metadata::MetadataPort;
pub use progress_sink::{NoopProgressSink, ProgressSink};
