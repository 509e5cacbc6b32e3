//! Conversion of yt-dlp's JSON dump into media snapshots.

use serde::Deserialize;

use yoink_core::media::curate_formats;
use yoink_core::{FormatOption, MediaInfo, PlaylistInfo, VideoInfo};

#[derive(Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    uploader: Option<String>,
    view_count: Option<u64>,
    description: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
    #[serde(default)]
    entries: Vec<Option<RawEntry>>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    format_note: Option<String>,
    ext: Option<String>,
    height: Option<u32>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
    vcodec: Option<String>,
    acodec: Option<String>,
    fps: Option<f64>,
    tbr: Option<f64>,
}

impl RawFormat {
    fn into_option(self) -> FormatOption {
        let vcodec = self.vcodec.unwrap_or_else(|| "none".to_string());
        let acodec = self.acodec.unwrap_or_else(|| "none".to_string());
        let has_video = vcodec != "none";
        let has_audio = acodec != "none";
        let resolution = match self.height {
            Some(h) if has_video && h > 0 => format!("{h}p"),
            _ => String::new(),
        };
        FormatOption {
            format_id: self.format_id.unwrap_or_default(),
            format_note: self.format_note.unwrap_or_default(),
            ext: self.ext.unwrap_or_default(),
            resolution,
            filesize: self
                .filesize
                .or(self.filesize_approx)
                .and_then(whole_number),
            vcodec,
            acodec,
            has_video,
            has_audio,
            fps: self.fps,
            tbr: self.tbr,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_number(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

/// Parse yt-dlp's `--dump-single-json` output for `url`.
pub fn parse_media_info(url: &str, json: &str) -> Result<MediaInfo, serde_json::Error> {
    let raw: RawInfo = serde_json::from_str(json)?;
    Ok(into_media_info(url, raw))
}

fn into_media_info(url: &str, raw: RawInfo) -> MediaInfo {
    if raw.kind.as_deref() == Some("playlist") {
        let videos: Vec<VideoInfo> = raw
            .entries
            .into_iter()
            .flatten()
            .map(|entry| VideoInfo {
                video_id: entry.id.unwrap_or_default(),
                title: entry.title.unwrap_or_else(|| "Unknown".to_string()),
                url: entry.url.unwrap_or_default(),
                duration: entry.duration.and_then(whole_number),
                ..Default::default()
            })
            .collect();
        return MediaInfo::Playlist(PlaylistInfo {
            playlist_id: raw.id.unwrap_or_default(),
            title: raw.title.unwrap_or_else(|| "Unknown Playlist".to_string()),
            url: url.to_string(),
            video_count: videos.len(),
            videos,
        });
    }

    MediaInfo::Video(VideoInfo {
        video_id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_else(|| "Unknown".to_string()),
        url: url.to_string(),
        duration: raw.duration.and_then(whole_number),
        thumbnail: raw.thumbnail,
        uploader: raw.uploader,
        view_count: raw.view_count,
        description: raw.description,
        formats: curate_formats(raw.formats.into_iter().map(RawFormat::into_option).collect()),
    })
}
