//! Video and playlist snapshots.

use serde::{Deserialize, Serialize};

use super::format::FormatOption;

/// Metadata for a single video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Source-specific video id.
    pub video_id: String,
    /// Display title.
    pub title: String,
    /// Canonical URL to download from.
    pub url: String,
    /// Length in seconds.
    pub duration: Option<u64>,
    /// Thumbnail URL.
    pub thumbnail: Option<String>,
    /// Channel or uploader name.
    pub uploader: Option<String>,
    /// View count at extraction time.
    pub view_count: Option<u64>,
    /// Long description.
    pub description: Option<String>,
    /// Curated encodings; empty for flat playlist entries.
    #[serde(default)]
    pub formats: Vec<FormatOption>,
}

impl VideoInfo {
    /// Duration as `h:mm:ss` or `m:ss`, `Unknown` when absent.
    #[must_use]
    pub fn duration_display(&self) -> String {
        let Some(total) = self.duration else {
            return "Unknown".to_string();
        };
        let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        }
    }
}

/// Metadata for a playlist; entries carry no formats.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    /// Source-specific playlist id.
    pub playlist_id: String,
    /// Display title.
    pub title: String,
    /// URL the playlist was resolved from.
    pub url: String,
    /// Number of entries.
    pub video_count: usize,
    /// Entries in playlist order.
    #[serde(default)]
    pub videos: Vec<VideoInfo>,
}

/// Result of resolving a URL: a single video or a collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaInfo {
    /// A single video.
    Video(VideoInfo),
    /// A playlist or channel listing.
    Playlist(PlaylistInfo),
}

impl MediaInfo {
    /// Display title of the video or playlist.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Video(v) => &v.title,
            Self::Playlist(p) => &p.title,
        }
    }

    /// Whether this resolved to a collection.
    #[must_use]
    pub const fn is_playlist(&self) -> bool {
        matches!(self, Self::Playlist(_))
    }

    /// URLs to download: the video itself, or every playlist entry.
    #[must_use]
    pub fn entry_urls(&self) -> Vec<String> {
        match self {
            Self::Video(v) => vec![v.url.clone()],
            Self::Playlist(p) => p
                .videos
                .iter()
                .filter(|v| !v.url.is_empty())
                .map(|v| v.url.clone())
                .collect(),
        }
    }
}
