//! Read-only metadata snapshots.
//!
//! Produced by the metadata source, consumed by callers to pick a format or
//! expand a playlist. Nothing in here mutates after construction.

mod format;
mod info;

pub use format::{FormatOption, QualityPreset, curate_formats, human_size};
pub use info::{MediaInfo, PlaylistInfo, VideoInfo};
