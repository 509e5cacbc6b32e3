//! MCP (Model Context Protocol) server for yoink.
//!
//! Exposes a [`DownloadManagerPort`](yoink_core::DownloadManagerPort) as MCP
//! tools over stdio: JSON-RPC 2.0, one message per line. Progress is not
//! streamed; clients poll `get_download_progress` or `list_downloads`.
#![deny(unused_crate_dependencies)]

pub(crate) mod protocol;
pub mod server;
pub(crate) mod tools;

pub use server::{McpServer, McpServerError};
pub use tools::{Tool, ToolContent, ToolResult};
