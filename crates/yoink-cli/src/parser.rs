//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Download videos with yt-dlp, several at a time.
#[derive(Parser, Debug)]
#[command(name = "yoink")]
#[command(about = "Grab videos and playlists, several at a time")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Path to the yt-dlp executable (looked up on PATH otherwise)
    #[arg(long = "yt-dlp", env = "YOINK_YTDLP", global = true)]
    pub ytdlp: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
