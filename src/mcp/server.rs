//! MCP server implementation.

use super::protocol::*;
use super::tools::{get_prompts, get_tools};
use crate::agent::{parse_tool_call, ToolCall, ToolContext};
use crate::config::{AgentSettings, Prompts};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "studymode";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server exposing the study tools and prompt.
pub struct McpServer {
    tools: ToolContext,
    prompts: Prompts,
    agent: AgentSettings,
}

impl McpServer {
    pub fn new(tools: ToolContext, prompts: Prompts, agent: AgentSettings) -> Self {
        Self { tools, prompts, agent }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock()).await
    }

    /// Serve newline-delimited JSON-RPC from `input` to `output`.
    pub async fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> anyhow::Result<()> {
        info!("Study Mode MCP server starting");

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    let response = JsonRpcResponse::error(None, PARSE_ERROR, "Parse error");
                    writeln!(output, "{}", serde_json::to_string(&response)?)?;
                    output.flush()?;
                    continue;
                }
            };

            if let Some(response) = self.handle_request(request).await {
                writeln!(output, "{}", serde_json::to_string(&response)?)?;
                output.flush()?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request. Notifications yield no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("MCP request: {}", request.method);

        if request.is_notification() {
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => JsonRpcResponse::from_result(request.id, &ToolsListResult { tools: get_tools() }),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "prompts/list" => JsonRpcResponse::from_result(
                request.id,
                &PromptsListResult {
                    prompts: get_prompts(&self.prompts.study.name),
                },
            ),
            "prompts/get" => self.handle_prompts_get(request.id, request.params),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", request.method),
            ),
        };

        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        if let Some(params) = params.and_then(|p| serde_json::from_value::<InitializeParams>(p).ok()) {
            info!(
                "MCP client {} connected (protocol {})",
                params.client_info.map(|c| c.name).unwrap_or_else(|| "unknown".to_string()),
                params.protocol_version.unwrap_or_else(|| "unspecified".to_string())
            );
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChanged { list_changed: false },
                prompts: ListChanged { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e)),
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({})).to_string();
        let tool = match parse_tool_call(&params.name, &arguments) {
            Ok(tool) => tool,
            Err(e) => return JsonRpcResponse::from_result(id, &ToolCallResult::error(e.to_string())),
        };

        let result = match tool {
            ToolCall::ShowExternalUrl => {
                ToolCallResult::resource(self.tools.external_url_resource()["resource"].clone())
            }
            ToolCall::DocSearchTool { .. } => match self.tools.execute(&tool).await {
                Ok(text) => ToolCallResult::text(text),
                Err(e) => ToolCallResult::error(e.to_string()),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_prompts_get(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: PromptGetParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Invalid params: {}", e)),
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        if params.name != self.prompts.study.name {
            return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Unknown prompt: {}", params.name));
        }

        let result = PromptGetResult {
            description: "Study mode system prompt".to_string(),
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: Content::Text {
                    text: self.prompts.study_system(&self.agent),
                },
            }],
        };

        JsonRpcResponse::from_result(id, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use std::sync::Arc;

    fn server() -> McpServer {
        let knowledge = Arc::new(KnowledgeBase::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&["cells"])),
        ));
        McpServer::new(
            ToolContext::new(knowledge, 3, "https://example.com"),
            Prompts::default(),
            AgentSettings::default(),
        )
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})).unwrap()
    }

    async fn call(server: &McpServer, method: &str, params: Value) -> Value {
        let response = server.handle_request(request(1, method, params)).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_advertises_tools_and_prompts() {
        let response = call(&server(), "initialize", json!({"clientInfo": {"name": "inspector"}})).await;
        assert_eq!(response["result"]["serverInfo"]["name"], "studymode");
        assert_eq!(response["result"]["capabilities"]["prompts"]["listChanged"], false);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_show_external_url_returns_resource_content() {
        let response = call(&server(), "tools/call", json!({"name": "show_external_url"})).await;
        let content = &response["result"]["content"][0];
        assert_eq!(content["type"], "resource");
        assert_eq!(content["resource"]["uri"], "ui://greeting");
        assert_eq!(content["resource"]["text"], "https://example.com");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_tool_error() {
        let response = call(&server(), "tools/call", json!({"name": "generate_quiz"})).await;
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_prompts() {
        let server = server();
        let listed = call(&server, "prompts/list", json!({})).await;
        assert_eq!(listed["result"]["prompts"][0]["name"], "prompt-v1");

        let fetched = call(&server, "prompts/get", json!({"name": "prompt-v1"})).await;
        let text = fetched["result"]["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("STUDY MODE"));
        assert!(text.contains("Asia/Karachi"));
        assert!(!text.contains("{{current_date}}"));

        let missing = call(&server, "prompts/get", json!({"name": "prompt-v2"})).await;
        assert_eq!(missing["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&server(), "resources/list", json!({})).await;
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_skips_notifications_and_reports_parse_errors() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
            "\n"
        );
        let mut output = Vec::new();
        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(lines[1]["id"], 7);
    }
}
