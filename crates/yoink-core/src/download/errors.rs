//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error`. For I/O errors, we capture the kind
//! and message as strings.
//!
//! Remote failures (rate limiting, unavailable videos, access denied) are not
//! split into variants: they arrive as text from the fetcher and are only
//! told apart by that text, see [`super::friendly`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::friendly;

/// Error type for download operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// I/O error during local file operations (output directory, disk).
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The fetcher process could not be started or exited abnormally.
    #[error("Process error: {message}")]
    Process {
        /// Detailed error message.
        message: String,
    },

    /// Metadata could not be resolved or parsed.
    #[error("Metadata error: {message}")]
    Metadata {
        /// Detailed error message.
        message: String,
    },

    /// A required external tool is not installed.
    #[error("{tool} not found")]
    ToolMissing {
        /// Name of the missing tool (e.g., "yt-dlp").
        tool: String,
    },

    /// Download was cancelled by user.
    #[error("Download cancelled")]
    Cancelled,

    /// Uncategorized error; displays the raw text unchanged.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a process error.
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
        }
    }

    /// Create a metadata error.
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }

    /// Create a missing tool error.
    pub fn tool_missing(tool: impl Into<String>) -> Self {
        Self::ToolMissing { tool: tool.into() }
    }

    /// Create a generic error carrying raw text.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if retrying later might succeed (rate limits, timeouts, network).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Cancelled | Self::ToolMissing { .. } => false,
            other => friendly::is_transient(&other.to_string()),
        }
    }

    /// Convert to a user-friendly message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "Download was cancelled.".to_string(),
            Self::ToolMissing { tool } => {
                format!("{tool} is not installed. Install it and make sure it is on PATH.")
            }
            other => friendly::friendly_message(&other.to_string()),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
