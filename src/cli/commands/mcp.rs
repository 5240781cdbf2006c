//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the MCP server.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let server = McpServer::new(
        orchestrator.tool_context()?,
        orchestrator.prompts().clone(),
        orchestrator.settings().agent.clone(),
    );
    server.run().await
}
