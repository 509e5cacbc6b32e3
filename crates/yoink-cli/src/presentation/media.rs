//! Video and playlist details for `yoink info`.

use std::fmt::Write;

use yoink_core::{DownloadProgress, DownloadStatus, MediaInfo, PlaylistInfo, VideoInfo};

/// Print resolved metadata to stdout.
pub fn print_media(info: &MediaInfo) {
    let text = match info {
        MediaInfo::Video(video) => render_video(video),
        MediaInfo::Playlist(playlist) => render_playlist(playlist),
    };
    print!("{text}");
}

fn render_video(video: &VideoInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Title:    {}", video.title);
    let _ = writeln!(
        out,
        "  Uploader: {}",
        video.uploader.as_deref().unwrap_or("Unknown")
    );
    let _ = writeln!(out, "  Duration: {}", video.duration_display());
    if let Some(views) = video.view_count {
        let _ = writeln!(out, "  Views:    {views}");
    }

    if video.formats.is_empty() {
        let _ = writeln!(out, "\nNo formats listed; the best available will be used.");
        return out;
    }
    let _ = writeln!(out, "\nAvailable formats:");
    for format in &video.formats {
        let streams = match (format.has_video, format.has_audio) {
            (true, true) => "A+V",
            (true, false) => "V only",
            _ => "A only",
        };
        let _ = writeln!(
            out,
            "  {:>8}  {:<40}  ({streams})",
            format.format_id,
            format.display_name()
        );
    }
    out
}

fn render_playlist(playlist: &PlaylistInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Playlist: {}", playlist.title);
    let _ = writeln!(out, "  Videos:   {}\n", playlist.video_count);
    for (i, video) in playlist.videos.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}. {}  [{}]",
            i + 1,
            video.title,
            video.duration_display()
        );
    }
    out
}

/// One-line outcome of a finished job.
pub fn summary_line(progress: &DownloadProgress) -> String {
    let name = if progress.title.is_empty() {
        progress.id.as_str()
    } else {
        progress.title.as_str()
    };
    match progress.status {
        DownloadStatus::Finished => match &progress.output_path {
            Some(path) => format!("✓ {name} -> {}", path.display()),
            None => format!("✓ {name}"),
        },
        DownloadStatus::Cancelled => format!("⊘ {name}: cancelled"),
        DownloadStatus::Error => format!(
            "✗ {name}: {}",
            yoink_core::friendly_message(progress.error.as_deref().unwrap_or("unknown error"))
        ),
        other => format!("… {name}: {other}"),
    }
}
