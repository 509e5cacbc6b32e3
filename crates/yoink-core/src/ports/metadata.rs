//! Metadata port: read-only lookups that do not download anything.

use async_trait::async_trait;

use crate::download::DownloadError;
use crate::media::{FormatOption, MediaInfo, PlaylistInfo, VideoInfo};

/// Port for resolving URLs into video or playlist metadata.
///
/// Only [`fetch`](Self::fetch) is required; the other lookups are derived
/// from a single resolution.
#[async_trait]
pub trait MetadataPort: Send + Sync {
    /// Resolve `url` to a video or a playlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached or parsed.
    async fn fetch(&self, url: &str) -> Result<MediaInfo, DownloadError>;

    /// Resolve `url`, requiring a single video.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Metadata`] if the URL is a playlist.
    async fn video_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        match self.fetch(url).await? {
            MediaInfo::Video(video) => Ok(video),
            MediaInfo::Playlist(_) => Err(DownloadError::metadata(format!(
                "{url} is a playlist, not a video"
            ))),
        }
    }

    /// Resolve `url`, requiring a playlist.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Metadata`] if the URL is a single video.
    async fn playlist_info(&self, url: &str) -> Result<PlaylistInfo, DownloadError> {
        match self.fetch(url).await? {
            MediaInfo::Playlist(playlist) => Ok(playlist),
            MediaInfo::Video(_) => Err(DownloadError::metadata(format!(
                "{url} is a video, not a playlist"
            ))),
        }
    }

    /// Curated formats of a video; empty for playlists.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    async fn formats(&self, url: &str) -> Result<Vec<FormatOption>, DownloadError> {
        Ok(match self.fetch(url).await? {
            MediaInfo::Video(video) => video.formats,
            MediaInfo::Playlist(_) => Vec::new(),
        })
    }

    /// Whether `url` resolves to a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution fails.
    async fn is_playlist(&self, url: &str) -> Result<bool, DownloadError> {
        Ok(self.fetch(url).await?.is_playlist())
    }
}
