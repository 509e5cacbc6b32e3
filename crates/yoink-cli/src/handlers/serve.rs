//! `yoink serve`: expose the download manager as MCP tools on stdio.

use yoink_mcp::McpServer;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the serve command. Returns when the client closes stdin.
pub async fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let result = McpServer::new(ctx.manager()).serve_stdio().await;
    ctx.manager().shutdown();
    result.map_err(CliError::from)
}
