//! Encoding options offered for a single video.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// One encoding of a video as reported by the metadata source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Source-specific format identifier.
    pub format_id: String,
    /// Free-form note (e.g. "1080p60", "medium").
    #[serde(default)]
    pub format_note: String,
    /// Container extension.
    #[serde(default)]
    pub ext: String,
    /// Resolution label such as `1080p`, empty for audio-only.
    #[serde(default)]
    pub resolution: String,
    /// Exact or approximate size in bytes.
    pub filesize: Option<u64>,
    /// Video codec, `none` when absent.
    #[serde(default)]
    pub vcodec: String,
    /// Audio codec, `none` when absent.
    #[serde(default)]
    pub acodec: String,
    /// Carries a video stream.
    #[serde(default)]
    pub has_video: bool,
    /// Carries an audio stream.
    #[serde(default)]
    pub has_audio: bool,
    /// Frames per second.
    pub fps: Option<f64>,
    /// Total bitrate in kbit/s.
    pub tbr: Option<f64>,
}

impl FormatOption {
    /// Short label: resolution, note, extension and size joined by ` | `.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if !self.resolution.is_empty() {
            parts.push(self.resolution.clone());
        }
        if !self.format_note.is_empty() {
            parts.push(self.format_note.clone());
        }
        if !self.ext.is_empty() {
            parts.push(self.ext.to_uppercase());
        }
        if let Some(size) = self.filesize.filter(|s| *s > 0) {
            parts.push(human_size(size));
        }
        if parts.is_empty() {
            self.format_id.clone()
        } else {
            parts.join(" | ")
        }
    }

    /// Format selector to request this option.
    ///
    /// Video-only formats are paired with the best audio stream.
    #[must_use]
    pub fn selector(&self) -> String {
        if self.has_video && !self.has_audio {
            format!("{}+bestaudio", self.format_id)
        } else {
            self.format_id.clone()
        }
    }

    /// Is this an audio-only stream?
    #[must_use]
    pub const fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Vertical resolution parsed from the label (`720p` → 720), 0 if unknown.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.resolution
            .strip_suffix('p')
            .and_then(|h| h.parse().ok())
            .unwrap_or(0)
    }

    fn bitrate(&self) -> f64 {
        self.tbr.unwrap_or(0.0)
    }
}

/// Format a byte count as `12.3 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// Reduce a raw format list to one option per resolution.
///
/// Duplicate ids are dropped. For each resolution the highest-bitrate video
/// format wins; results are ordered by height, tallest first, and the single
/// best audio-only format is appended at the end. Formats with neither
/// stream are discarded.
#[must_use]
pub fn curate_formats(raw: Vec<FormatOption>) -> Vec<FormatOption> {
    let mut seen = HashSet::new();
    let mut best: HashMap<String, FormatOption> = HashMap::new();
    let mut best_audio: Option<FormatOption> = None;

    for format in raw {
        if !seen.insert(format.format_id.clone()) {
            continue;
        }
        if format.is_audio_only() {
            if best_audio
                .as_ref()
                .is_none_or(|current| format.bitrate() > current.bitrate())
            {
                best_audio = Some(format);
            }
            continue;
        }
        if !format.has_video {
            continue;
        }
        let key = if format.resolution.is_empty() {
            format.format_id.clone()
        } else {
            format.resolution.clone()
        };
        match best.get(&key) {
            Some(existing) if format.bitrate() <= existing.bitrate() => {}
            _ => {
                best.insert(key, format);
            }
        }
    }

    let mut curated: Vec<FormatOption> = best.into_values().collect();
    curated.sort_by(|a, b| {
        b.height()
            .cmp(&a.height())
            .then_with(|| a.format_id.cmp(&b.format_id))
    });
    curated.extend(best_audio);
    curated
}

/// Quality shortcuts offered when downloading many videos at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Best mp4 video with m4a audio.
    #[default]
    Best,
    /// Capped at 720p.
    P720,
    /// Capped at 480p.
    P480,
    /// Audio only, m4a preferred.
    AudioM4a,
}

impl QualityPreset {
    /// All presets in menu order.
    pub const ALL: [Self; 4] = [Self::Best, Self::P720, Self::P480, Self::AudioM4a];

    /// Format selector string for this preset.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            Self::P720 => "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720]",
            Self::P480 => "bestvideo[height<=480][ext=mp4]+bestaudio[ext=m4a]/best[height<=480]",
            Self::AudioM4a => "bestaudio[ext=m4a]/bestaudio",
        }
    }

    /// Short name, also accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::AudioM4a => "audio",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "720p" | "720" => Ok(Self::P720),
            "480p" | "480" => Ok(Self::P480),
            "audio" | "m4a" => Ok(Self::AudioM4a),
            other => Err(format!(
                "unknown quality '{other}' (expected best, 720p, 480p or audio)"
            )),
        }
    }
}
