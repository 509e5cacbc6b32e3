//! Line protocol between yt-dlp and the adapter.
//!
//! yt-dlp is told (through `--progress-template` and `--print`) to emit one
//! tagged line per event. The tag is followed by a JSON payload rendered
//! with yt-dlp's `j` conversion:
//!
//! ```text
//! [yoink:title] "Some video"
//! [yoink:dl] {"status": "downloading", "downloaded_bytes": 1024, "total_bytes": 4096, ...}
//! [yoink:pp] {"status": "started", "postprocessor": "Merger"}
//! [yoink:file] "/home/me/Downloads/Some video.mp4"
//! ```
//!
//! Every other line is ordinary yt-dlp output.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use yoink_core::{FetchEvent, PostProcessPhase, TransferPhase};

/// Tag for transfer progress lines.
pub const TAG_DOWNLOAD: &str = "[yoink:dl]";
/// Tag for post-processor lines.
pub const TAG_POSTPROCESS: &str = "[yoink:pp]";
/// Tag for the resolved title.
pub const TAG_TITLE: &str = "[yoink:title]";
/// Tag for the final file path.
pub const TAG_FILE: &str = "[yoink:file]";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when parsing protocol lines.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Missing or invalid 'status' field")]
    InvalidStatus,

    #[error("Unknown status: {0}")]
    UnknownStatus(String),
}

// ============================================================================
// Protocol Lines
// ============================================================================

/// One recognised line of yt-dlp output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolLine {
    /// Something the engine should hear about.
    Event(FetchEvent),
    /// Path of the file after the final move.
    FinalPath(PathBuf),
    /// A protocol line carrying nothing actionable (e.g. `processing`).
    Skip,
}

#[derive(Deserialize)]
struct RawTransfer {
    status: Option<String>,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
    speed: Option<f64>,
    eta: Option<f64>,
    filename: Option<String>,
}

#[derive(Deserialize)]
struct RawPostProcess {
    status: Option<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a single output line.
///
/// Returns `Ok(None)` for lines that are not part of the protocol.
pub fn parse_line(line: &str) -> Result<Option<ProtocolLine>, ProtocolError> {
    let line = line.trim();
    let Some((tag, payload)) = line.split_once(' ') else {
        return Ok(None);
    };

    let parsed = match tag {
        TAG_DOWNLOAD => parse_transfer(payload)?,
        TAG_POSTPROCESS => parse_postprocess(payload)?,
        TAG_TITLE => ProtocolLine::Event(FetchEvent::Resolved {
            title: serde_json::from_str(payload)?,
        }),
        TAG_FILE => match serde_json::from_str::<Option<String>>(payload)? {
            Some(path) if !path.is_empty() => ProtocolLine::FinalPath(PathBuf::from(path)),
            _ => ProtocolLine::Skip,
        },
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

fn parse_transfer(payload: &str) -> Result<ProtocolLine, ProtocolError> {
    let raw: RawTransfer = serde_json::from_str(payload)?;
    let phase = match raw.status.as_deref().ok_or(ProtocolError::InvalidStatus)? {
        "downloading" => TransferPhase::Downloading,
        "finished" => TransferPhase::Finished,
        // Failures surface through the exit status and stderr.
        "error" => return Ok(ProtocolLine::Skip),
        other => return Err(ProtocolError::UnknownStatus(other.to_string())),
    };

    Ok(ProtocolLine::Event(FetchEvent::Transfer {
        phase,
        downloaded_bytes: raw.downloaded_bytes.map_or(0, to_u64),
        total_bytes: raw.total_bytes.map(to_u64),
        total_bytes_estimate: raw.total_bytes_estimate.map(to_u64),
        speed: raw.speed,
        eta: raw.eta.map(to_seconds),
        filename: raw.filename.map(PathBuf::from),
    }))
}

fn parse_postprocess(payload: &str) -> Result<ProtocolLine, ProtocolError> {
    let raw: RawPostProcess = serde_json::from_str(payload)?;
    let phase = match raw.status.as_deref().ok_or(ProtocolError::InvalidStatus)? {
        "started" => PostProcessPhase::Started,
        "finished" => PostProcessPhase::Finished,
        "processing" => return Ok(ProtocolLine::Skip),
        other => return Err(ProtocolError::UnknownStatus(other.to_string())),
    };
    Ok(ProtocolLine::Event(FetchEvent::PostProcessing {
        phase,
        output_path: None,
    }))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u64(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_seconds(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        -1
    }
}

/// Extract the message of a yt-dlp `ERROR:` line.
pub fn error_message(line: &str) -> Option<&str> {
    line.trim().strip_prefix("ERROR:").map(str::trim)
}
