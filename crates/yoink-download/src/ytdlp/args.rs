//! Command-line construction for yt-dlp invocations.

use std::ffi::OsString;

use yoink_core::DownloadRequest;

use super::protocol::{TAG_DOWNLOAD, TAG_FILE, TAG_POSTPROCESS, TAG_TITLE};

/// Format selector used for audio extraction.
pub const AUDIO_ONLY_FORMAT: &str = "bestaudio/best";

/// Arguments for a metadata-only lookup (single JSON document on stdout).
pub fn metadata_args(url: &str) -> Vec<OsString> {
    ["--dump-single-json", "--flat-playlist", "--no-warnings", "--"]
        .into_iter()
        .map(OsString::from)
        .chain(std::iter::once(OsString::from(url)))
        .collect()
}

/// Arguments that retrieve `request` and report through the line protocol.
pub fn download_args(request: &DownloadRequest, extra: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |s: &str| args.push(OsString::from(s));

    push("--newline");
    push("--progress");
    push("--no-simulate");
    push("--no-playlist");
    push("--progress-template");
    push(&format!(
        "download:{TAG_DOWNLOAD} %(progress.{{status,downloaded_bytes,total_bytes,total_bytes_estimate,speed,eta,filename}})j"
    ));
    push("--progress-template");
    push(&format!(
        "postprocess:{TAG_POSTPROCESS} %(progress.{{status,postprocessor}})j"
    ));
    push("--print");
    push(&format!("before_dl:{TAG_TITLE} %(title)j"));
    push("--print");
    push(&format!("after_move:{TAG_FILE} %(filepath)j"));

    push("-f");
    if request.audio_only {
        push(AUDIO_ONLY_FORMAT);
    } else {
        push(&request.format);
    }

    if let Some(limit) = request.speed_limit {
        push("--limit-rate");
        push(&limit.to_string());
    }

    if let Some(subs) = &request.subtitles {
        push("--write-subs");
        push("--write-auto-subs");
        push("--sub-langs");
        push(&subs.language);
    }

    if request.audio_only {
        push("-x");
        push("--audio-format");
        push("mp3");
    }

    for arg in extra {
        push(arg);
    }

    args.push(OsString::from("-o"));
    args.push(
        request
            .output_dir
            .join(&request.output_template)
            .into_os_string(),
    );
    args.push(OsString::from("--"));
    args.push(OsString::from(&request.url));
    args
}
