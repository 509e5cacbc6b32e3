//! Composition root: wires the yt-dlp adapter into a download manager.

use std::path::PathBuf;
use std::sync::Arc;

use yoink_core::ports::{DownloadManagerConfig, FetcherPort, MetadataPort};
use yoink_download::{DownloadManager, DownloadManagerDeps, YtDlp, YtDlpConfig};

use crate::error::CliError;

/// Settings resolved from flags and environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Explicit yt-dlp executable.
    pub ytdlp: Option<PathBuf>,
    /// Simultaneous downloads.
    pub max_concurrent: usize,
}

/// Everything a handler needs.
pub struct CliContext {
    manager: DownloadManager,
}

impl CliContext {
    /// The download manager.
    pub const fn manager(&self) -> &DownloadManager {
        &self.manager
    }
}

/// Build the CLI context.
///
/// Must run inside a Tokio runtime.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let mut ytdlp_config = YtDlpConfig::default();
    if let Some(binary) = config.ytdlp {
        ytdlp_config = ytdlp_config.with_binary(binary);
    }
    let ytdlp = Arc::new(YtDlp::new(ytdlp_config)?);
    tracing::debug!(binary = %ytdlp.binary().display(), "Resolved yt-dlp");

    let fetcher: Arc<dyn FetcherPort> = Arc::clone(&ytdlp) as Arc<dyn FetcherPort>;
    let metadata: Arc<dyn MetadataPort> = ytdlp;
    let manager = DownloadManager::new(
        DownloadManagerConfig::default().with_max_concurrent(config.max_concurrent),
        DownloadManagerDeps { fetcher, metadata },
    );
    Ok(CliContext { manager })
}
