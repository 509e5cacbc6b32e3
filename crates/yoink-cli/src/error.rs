//! CLI-specific error types and exit codes.

use thiserror::Error;

use yoink_core::DownloadError;
use yoink_mcp::McpServerError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// A download or lookup failed.
    #[error("{0}")]
    Download(String),

    /// Argument validation error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (output directory, terminal).
    #[error("IO error: {0}")]
    Io(String),

    /// yt-dlp (or another required tool) is not installed.
    #[error("{0}")]
    ToolMissing(String),

    /// Some jobs of a batch did not finish.
    #[error("{failed} of {total} downloads did not complete")]
    Incomplete {
        /// Jobs that ended in error or were cancelled.
        failed: usize,
        /// Jobs in the batch.
        total: usize,
    },
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Download(_) | Self::Incomplete { .. } => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::ToolMissing(_) => 69, // EX_UNAVAILABLE
            Self::Io(_) => 74,          // EX_IOERR
        }
    }
}

impl From<DownloadError> for CliError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::ToolMissing { .. } => Self::ToolMissing(err.user_message()),
            DownloadError::Io { .. } => Self::Io(err.to_string()),
            other => Self::Download(other.user_message()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<McpServerError> for CliError {
    fn from(err: McpServerError) -> Self {
        Self::Io(err.to_string())
    }
}
