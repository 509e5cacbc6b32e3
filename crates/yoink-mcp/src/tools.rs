//! The tools exposed to MCP clients and their handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use yoink_core::ports::{DownloadManagerPort, NoopProgressSink, ProgressSink};
use yoink_core::{DownloadError, DownloadRequest, JobId, MediaInfo};

use crate::protocol::RpcError;

/// One MCP tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetVideoInfo,
    GetPlaylistInfo,
    GetFormats,
    StartDownload,
    ListDownloads,
    GetDownloadProgress,
    CancelDownload,
}

impl Tool {
    /// Every tool, in the order `tools/list` reports them.
    pub const ALL: [Self; 7] = [
        Self::GetVideoInfo,
        Self::GetPlaylistInfo,
        Self::GetFormats,
        Self::StartDownload,
        Self::ListDownloads,
        Self::GetDownloadProgress,
        Self::CancelDownload,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::GetVideoInfo => "get_video_info",
            Self::GetPlaylistInfo => "get_playlist_info",
            Self::GetFormats => "get_formats",
            Self::StartDownload => "start_download",
            Self::ListDownloads => "list_downloads",
            Self::GetDownloadProgress => "get_download_progress",
            Self::CancelDownload => "cancel_download",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::GetVideoInfo => {
                "Fetch video metadata including title, duration, uploader, and available formats."
            }
            Self::GetPlaylistInfo => "Fetch playlist metadata including all video titles and IDs.",
            Self::GetFormats => "List available download formats/qualities for a video URL.",
            Self::StartDownload => {
                "Start downloading a video. Returns a download_id for tracking progress."
            }
            Self::ListDownloads => "List all downloads with their current status and progress.",
            Self::GetDownloadProgress => "Get the current progress of a specific download.",
            Self::CancelDownload => "Cancel a queued or active download.",
        }
    }

    /// JSON Schema of the tool's arguments.
    pub fn input_schema(self) -> Value {
        match self {
            Self::GetVideoInfo | Self::GetPlaylistInfo | Self::GetFormats => json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video or playlist URL" }
                },
                "required": ["url"]
            }),
            Self::StartDownload => json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL" },
                    "format_string": {
                        "type": "string",
                        "description": "yt-dlp format selector (defaults to best mp4)"
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Directory to save into (defaults to ~/Downloads)"
                    }
                },
                "required": ["url"]
            }),
            Self::ListDownloads => json!({ "type": "object", "properties": {} }),
            Self::GetDownloadProgress | Self::CancelDownload => json!({
                "type": "object",
                "properties": {
                    "download_id": { "type": "string", "description": "Id returned by start_download" }
                },
                "required": ["download_id"]
            }),
        }
    }

    /// Entry for `tools/list`.
    pub fn definition(self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
        })
    }
}

/// Content item of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result carrying `value` as pretty-printed JSON text.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self {
                content: vec![ToolContent::Text { text }],
                is_error: false,
            },
            Err(e) => Self::error(format!("Failed to encode result: {e}")),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Text of the first content item.
    pub fn text(&self) -> &str {
        self.content
            .first()
            .map_or("", |ToolContent::Text { text }| text.as_str())
    }
}

// Raw error text, not the CLI's friendly rewording.
impl From<DownloadError> for ToolResult {
    fn from(err: DownloadError) -> Self {
        Self::error(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StartArgs {
    url: String,
    #[serde(default)]
    format_string: Option<String>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct JobArgs {
    download_id: String,
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: Tool, arguments: Value) -> Result<T, RpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| RpcError::InvalidParams(format!("{}: {e}", tool.name())))
}

/// Run `tool` against the manager.
///
/// Bad arguments are a protocol error; everything else, including a failed
/// lookup, is a tool result.
pub async fn call(
    manager: &dyn DownloadManagerPort,
    tool: Tool,
    arguments: Value,
) -> Result<ToolResult, RpcError> {
    tracing::debug!(target: "yoink.mcp", tool = tool.name(), "Tool call");
    let result = match tool {
        Tool::GetVideoInfo => {
            let UrlArgs { url } = parse_args(tool, arguments)?;
            match manager.resolve_metadata(&url).await {
                Ok(MediaInfo::Video(video)) => ToolResult::json(&video),
                Ok(MediaInfo::Playlist(_)) => ToolResult::error(format!(
                    "{url} is a playlist, use get_playlist_info"
                )),
                Err(e) => e.into(),
            }
        }
        Tool::GetPlaylistInfo => {
            let UrlArgs { url } = parse_args(tool, arguments)?;
            match manager.resolve_metadata(&url).await {
                Ok(MediaInfo::Playlist(playlist)) => ToolResult::json(&playlist),
                Ok(MediaInfo::Video(_)) => {
                    ToolResult::error(format!("{url} is a video, use get_video_info"))
                }
                Err(e) => e.into(),
            }
        }
        Tool::GetFormats => {
            let UrlArgs { url } = parse_args(tool, arguments)?;
            match manager.formats(&url).await {
                Ok(formats) => ToolResult::json(&formats),
                Err(e) => e.into(),
            }
        }
        Tool::StartDownload => start_download(manager, parse_args(tool, arguments)?),
        Tool::ListDownloads => ToolResult::json(&manager.all_progress()),
        Tool::GetDownloadProgress => {
            let JobArgs { download_id } = parse_args(tool, arguments)?;
            manager
                .progress(&JobId::from(download_id.as_str()))
                .map_or_else(
                    || ToolResult::error(format!("No download found with id {download_id}")),
                    |progress| ToolResult::json(&progress),
                )
        }
        Tool::CancelDownload => {
            let JobArgs { download_id } = parse_args(tool, arguments)?;
            if manager.cancel(&JobId::from(download_id.as_str())) {
                ToolResult::json(&json!({ "status": "cancelled", "download_id": download_id }))
            } else {
                ToolResult::error(format!("No active download found with id {download_id}"))
            }
        }
    };
    Ok(result)
}

fn start_download(manager: &dyn DownloadManagerPort, args: StartArgs) -> ToolResult {
    let mut request = DownloadRequest::new(args.url);
    if let Some(format) = args.format_string {
        request = request.with_format(format);
    }
    if let Some(dir) = args.output_dir {
        request = request.with_output_dir(dir);
    }

    // Clients poll the progress table; nothing is pushed.
    let sink: Arc<dyn ProgressSink> = Arc::new(NoopProgressSink);
    let url = request.url.clone();
    match manager.submit(request, sink, false) {
        Some(id) => {
            tracing::info!(target: "yoink.mcp", id = %id, url = %url, "Download started");
            ToolResult::json(&json!({ "download_id": id, "status": "started" }))
        }
        None => ToolResult::error("This URL is already being downloaded"),
    }
}
