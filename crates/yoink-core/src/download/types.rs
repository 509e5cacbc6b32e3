//! Core domain types for downloads.
//!
//! Pure data types with no I/O dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Format selector used when the caller does not pick one.
pub const DEFAULT_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Output filename template used when the caller does not pick one.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Subtitle language used when subtitles are requested without a language.
pub const DEFAULT_SUBTITLE_LANGUAGE: &str = "en";

/// Length of a generated job token in hex characters.
const JOB_ID_LEN: usize = 12;

/// Opaque identifier for a single download job.
///
/// Generated at request creation as 12 lowercase hex characters. Retrying a
/// job always mints a new id; ids are never reused within a process.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random job id.
    #[must_use]
    pub fn generate() -> Self {
        let mut token = uuid::Uuid::new_v4().simple().to_string();
        token.truncate(JOB_ID_LEN);
        Self(token)
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Subtitle download options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleOptions {
    /// Subtitle language code (e.g., "en", "fr").
    pub language: String,
}

impl Default for SubtitleOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_SUBTITLE_LANGUAGE.to_string(),
        }
    }
}

/// Request to retrieve one video.
///
/// Immutable once submitted. Two requests refer to the same resource when
/// their URLs are equal; the scheduler uses that to reject concurrent
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Unique job identifier, generated at creation.
    pub id: JobId,
    /// Source URL of the video.
    pub url: String,
    /// Format selector string handed to the fetcher.
    pub format: String,
    /// Directory the output file is written into.
    pub output_dir: PathBuf,
    /// Output filename template (fetcher template syntax).
    pub output_template: String,
    /// Optional transfer rate cap in bytes per second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit: Option<u64>,
    /// Subtitle options; `None` means no subtitles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitleOptions>,
    /// Extract the audio track and convert it to mp3.
    pub audio_only: bool,
}

impl DownloadRequest {
    /// Create a new download request with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: JobId::generate(),
            url: url.into(),
            format: DEFAULT_FORMAT.to_string(),
            output_dir: default_output_dir(),
            output_template: DEFAULT_OUTPUT_TEMPLATE.to_string(),
            speed_limit: None,
            subtitles: None,
            audio_only: false,
        }
    }

    /// Set the format selector.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the output filename template.
    #[must_use]
    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = template.into();
        self
    }

    /// Cap the transfer rate in bytes per second.
    #[must_use]
    pub const fn with_speed_limit(mut self, bytes_per_sec: Option<u64>) -> Self {
        self.speed_limit = bytes_per_sec;
        self
    }

    /// Request subtitles in the given language.
    #[must_use]
    pub fn with_subtitles(mut self, language: impl Into<String>) -> Self {
        self.subtitles = Some(SubtitleOptions {
            language: language.into(),
        });
        self
    }

    /// Request audio extraction to mp3.
    #[must_use]
    pub const fn with_audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    /// Override the generated job id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = id.into();
        self
    }

    /// Copy this request under a freshly generated job id.
    ///
    /// Used for retries: same resource, new job.
    #[must_use]
    pub fn renewed(&self) -> Self {
        Self {
            id: JobId::generate(),
            ..self.clone()
        }
    }

    /// Whether both requests point at the same resource.
    #[must_use]
    pub fn same_resource(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

/// Default download directory: the platform download dir, then
/// `~/Downloads`, then the working directory.
#[must_use]
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}
