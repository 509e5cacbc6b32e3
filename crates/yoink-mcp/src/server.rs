//! Line-oriented JSON-RPC server loop.
//!
//! Each input line is one JSON-RPC message; each response is written as one
//! line and flushed. Notifications never get a response. Nothing but
//! responses is ever written to the output, so logging must go to stderr.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use yoink_core::ports::DownloadManagerPort;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, RpcError};
use crate::tools::{self, Tool};

/// Errors that end the server loop.
#[derive(Debug, Error)]
pub enum McpServerError {
    #[error("Failed to communicate with MCP client: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
struct ToolCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// MCP server over a download manager.
pub struct McpServer<'a> {
    manager: &'a dyn DownloadManagerPort,
}

impl<'a> McpServer<'a> {
    pub const fn new(manager: &'a dyn DownloadManagerPort) -> Self {
        Self { manager }
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<(), McpServerError> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(target: "yoink.mcp", "MCP server listening on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(trimmed).await {
                let out = serde_json::to_string(&response)? + "\n";
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        tracing::info!(target: "yoink.mcp", "MCP client closed the connection");
        Ok(())
    }

    /// Handle one message. Returns `None` for notifications.
    pub(crate) async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(target: "yoink.mcp", line, "Unparseable message");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    &RpcError::Parse(e.to_string()),
                ));
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    &RpcError::InvalidRequest(e.to_string()),
                ));
            }
        };

        let Some(id) = request.id else {
            tracing::debug!(target: "yoink.mcp", method = %request.method, "Notification");
            return None;
        };
        if request.jsonrpc != "2.0" {
            let error = RpcError::InvalidRequest(format!(
                "unsupported jsonrpc version {:?}",
                request.jsonrpc
            ));
            return Some(JsonRpcResponse::failure(id, &error));
        }

        Some(match self.dispatch(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::debug!(target: "yoink.mcp", method = %request.method, error = %e, "Request failed");
                JsonRpcResponse::failure(id, &e)
            }
        })
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let tools: Vec<Value> = Tool::ALL.into_iter().map(Tool::definition).collect();
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => {
                let call: ToolCall = serde_json::from_value(params.unwrap_or(Value::Null))
                    .map_err(|e| RpcError::InvalidParams(e.to_string()))?;
                let tool = Tool::from_name(&call.name)
                    .ok_or_else(|| RpcError::InvalidParams(format!("unknown tool {}", call.name)))?;
                let result = tools::call(self.manager, tool, call.arguments).await?;
                serde_json::to_value(result).map_err(|e| RpcError::Internal(e.to_string()))
            }
            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": "yoink",
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": {}
        }
    })
}
