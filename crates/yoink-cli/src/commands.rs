//! Subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use yoink_core::{DEFAULT_CONCURRENT, QualityPreset};

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show details and available formats of a video or playlist
    Info {
        /// Video or playlist URL
        url: String,
    },

    /// Download one or more videos or playlists
    Get(GetArgs),

    /// Serve the download manager as MCP tools over stdio
    Serve {
        /// Number of simultaneous downloads (1-10)
        #[arg(short, long, env = "YOINK_JOBS", default_value_t = DEFAULT_CONCURRENT)]
        jobs: usize,
    },
}

/// Arguments of `yoink get`.
#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    /// Video or playlist URLs
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Raw format selector passed to yt-dlp (e.g. "137+bestaudio")
    #[arg(short, long, conflicts_with = "quality")]
    pub format: Option<String>,

    /// Quality preset: best, 720p, 480p or audio
    #[arg(short, long)]
    pub quality: Option<QualityPreset>,

    /// Directory to save into (defaults to the Downloads folder)
    #[arg(short, long, env = "YOINK_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output filename template
    #[arg(short = 't', long)]
    pub template: Option<String>,

    /// Extract audio and convert it to mp3
    #[arg(long)]
    pub audio_only: bool,

    /// Download subtitles (default language: en)
    #[arg(long, value_name = "LANG", num_args = 0..=1, default_missing_value = "en")]
    pub subs: Option<String>,

    /// Cap the transfer rate, in bytes per second
    #[arg(long, value_name = "BYTES")]
    pub limit_rate: Option<u64>,

    /// Number of simultaneous downloads (1-10)
    #[arg(short, long, env = "YOINK_JOBS", default_value_t = DEFAULT_CONCURRENT)]
    pub jobs: usize,
}
