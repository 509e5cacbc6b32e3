//! yt-dlp subprocess adapter.
//!
//! Implements [`FetcherPort`] and [`MetadataPort`] by driving the `yt-dlp`
//! executable:
//! - `protocol`: tagged line parsing
//! - `args`: command-line construction
//! - `info`: JSON dump to media snapshots
//!
//! The child is spawned with `kill_on_drop`, so dropping an in-flight fetch
//! (the engine does this on cancellation) terminates the process.

mod args;
mod info;
mod protocol;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use yoink_core::ports::{FetchHooks, FetcherPort, MetadataPort};
use yoink_core::{
    DownloadError, DownloadRequest, FetchEvent, FetchOutcome, MediaInfo, PostProcessPhase,
};

pub use protocol::{ProtocolError, ProtocolLine, parse_line};

/// Executable name looked up on `PATH`.
pub const YTDLP_BINARY: &str = "yt-dlp";

/// How often a running transfer polls for cancellation between lines.
const CANCEL_POLL: Duration = Duration::from_millis(200);

/// Configuration for the yt-dlp adapter.
#[derive(Debug, Clone, Default)]
pub struct YtDlpConfig {
    /// Explicit executable path; `PATH` lookup when absent.
    pub binary: Option<PathBuf>,
    /// Extra arguments appended to every download invocation.
    pub extra_args: Vec<String>,
}

impl YtDlpConfig {
    /// Use a specific executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Append extra download arguments.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Fetcher and metadata source backed by the yt-dlp executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlp {
    /// Locate the executable.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ToolMissing`] if no executable is configured
    /// and none is found on `PATH`.
    pub fn new(config: YtDlpConfig) -> Result<Self, DownloadError> {
        let binary = match config.binary {
            Some(binary) => binary,
            None => which::which(YTDLP_BINARY)
                .map_err(|_| DownloadError::tool_missing(YTDLP_BINARY))?,
        };
        tracing::debug!(target: "yoink.download", binary = %binary.display(), "Using yt-dlp");
        Ok(Self {
            binary,
            extra_args: config.extra_args,
        })
    }

    /// Path of the executable in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn spawn_error(&self, err: &std::io::Error) -> DownloadError {
        if err.kind() == std::io::ErrorKind::NotFound {
            DownloadError::tool_missing(YTDLP_BINARY)
        } else {
            DownloadError::process(format!(
                "Failed to spawn {}: {err}",
                self.binary.display()
            ))
        }
    }

    /// Stream the child's output through `hooks` until it exits.
    async fn drive(
        &self,
        mut child: Child,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::process("Missing stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::process("Missing stderr"))?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let (mut out_open, mut err_open) = (true, true);
        let mut last_error: Option<String> = None;
        let mut final_path: Option<PathBuf> = None;
        let mut ticker = tokio::time::interval(CANCEL_POLL);

        while out_open || err_open {
            let (from_stderr, line) = tokio::select! {
                line = out_lines.next_line(), if out_open => (false, line),
                line = err_lines.next_line(), if err_open => (true, line),
                _ = ticker.tick() => {
                    if hooks.is_cancelled() {
                        kill(&mut child).await;
                        return Err(DownloadError::Cancelled);
                    }
                    continue;
                }
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    if from_stderr {
                        err_open = false;
                    } else {
                        out_open = false;
                    }
                    continue;
                }
                Err(e) => {
                    kill(&mut child).await;
                    return Err(DownloadError::process(e.to_string()));
                }
            };

            if from_stderr {
                if let Some(message) = protocol::error_message(&line) {
                    last_error = Some(message.to_string());
                }
            }

            match parse_line(&line) {
                Ok(Some(ProtocolLine::Event(event))) => {
                    if let Err(e) = hooks.on_event(event) {
                        kill(&mut child).await;
                        return Err(e);
                    }
                }
                Ok(Some(ProtocolLine::FinalPath(path))) => {
                    let event = FetchEvent::PostProcessing {
                        phase: PostProcessPhase::Finished,
                        output_path: Some(path.clone()),
                    };
                    final_path = Some(path);
                    if let Err(e) = hooks.on_event(event) {
                        kill(&mut child).await;
                        return Err(e);
                    }
                }
                Ok(Some(ProtocolLine::Skip) | None) => {}
                Err(e) => {
                    tracing::debug!(target: "yoink.download", error = %e, line = %line, "Unparseable protocol line");
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::process(e.to_string()))?;

        if !status.success() {
            let reason = last_error.unwrap_or_else(|| format!("yt-dlp exited with {status}"));
            return Err(DownloadError::other(reason));
        }

        Ok(FetchOutcome {
            output_path: final_path,
        })
    }
}

async fn kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::debug!(target: "yoink.download", error = %e, "Failed to kill yt-dlp");
    }
}

#[async_trait]
impl FetcherPort for YtDlp {
    async fn fetch(
        &self,
        request: &DownloadRequest,
        hooks: &mut dyn FetchHooks,
    ) -> Result<FetchOutcome, DownloadError> {
        let child = Command::new(&self.binary)
            .args(args::download_args(request, &self.extra_args))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        tracing::debug!(target: "yoink.download", id = %request.id, url = %request.url, "Spawned yt-dlp");
        self.drive(child, hooks).await
    }
}

#[async_trait]
impl MetadataPort for YtDlp {
    async fn fetch(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        let output = Command::new(&self.binary)
            .args(args::metadata_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .filter_map(protocol::error_message)
                .last()
                .map_or_else(
                    || format!("yt-dlp exited with {}", output.status),
                    str::to_string,
                );
            return Err(DownloadError::other(reason));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        info::parse_media_info(url, &json).map_err(|e| DownloadError::metadata(e.to_string()))
    }
}
