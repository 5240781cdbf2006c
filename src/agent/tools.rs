//! Tool definitions and implementations for the study agent.

use crate::envelope::DEFAULT_MIME_TYPE;
use crate::error::{Result, StudyError};
use crate::knowledge::{format_results, KnowledgeBase};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Reply given to the model when the knowledge base cannot be searched.
pub const SEARCH_UNAVAILABLE: &str = "Error: Unable to search documents at this time";

/// URI of the embeddable page returned by `show_external_url`.
pub const EXTERNAL_URL_URI: &str = "ui://greeting";

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the knowledge base.
    DocSearchTool { query: String },

    /// Show the configured external page.
    ShowExternalUrl,
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::DocSearchTool { .. } => "doc_search_tool",
            ToolCall::ShowExternalUrl => "show_external_url",
        }
    }

    /// Whether the tool's output is a UI resource rather than prose.
    pub fn returns_resource(&self) -> bool {
        matches!(self, ToolCall::ShowExternalUrl)
    }
}

/// Tool execution context with access to the knowledge base.
pub struct ToolContext {
    pub knowledge: Arc<KnowledgeBase>,
    pub search_k: usize,
    pub external_url: String,
}

impl ToolContext {
    pub fn new(knowledge: Arc<KnowledgeBase>, search_k: usize, external_url: &str) -> Self {
        Self {
            knowledge,
            search_k,
            external_url: external_url.to_string(),
        }
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::DocSearchTool { query } => Ok(self.execute_doc_search(query).await),
            ToolCall::ShowExternalUrl => Ok(self.external_url_resource().to_string()),
        }
    }

    async fn execute_doc_search(&self, query: &str) -> String {
        info!("doc_search_tool called with query: {}", query);

        match self.knowledge.search(query.trim(), self.search_k).await {
            Ok(hits) => format_results(&hits),
            Err(e) => {
                error!("doc_search_tool failed: {}", e);
                SEARCH_UNAVAILABLE.to_string()
            }
        }
    }

    /// The UI resource describing the external page.
    pub fn external_url_resource(&self) -> serde_json::Value {
        json!({
            "type": "resource",
            "resource": {
                "uri": EXTERNAL_URL_URI,
                "mimeType": DEFAULT_MIME_TYPE,
                "text": self.external_url,
            }
        })
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "doc_search_tool".to_string(),
                description: Some(
                    "Retrieves the most relevant information from the knowledge base by searching \
                    a vector store. It returns the matched content along with metadata \
                    (file name and source path)."
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "show_external_url".to_string(),
                description: Some("Show an external URL in an iframe.".to_string()),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {}
                })),
                strict: None,
            },
        },
    ]
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| StudyError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    match name {
        "doc_search_tool" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| StudyError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            Ok(ToolCall::DocSearchTool { query })
        }
        "show_external_url" => Ok(ToolCall::ShowExternalUrl),
        _ => Err(StudyError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, KeywordEmbedder};
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};

    async fn context(embedder: Arc<dyn crate::embedding::Embedder>) -> ToolContext {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[Document::new(
                "knowledge-base/biology.txt".to_string(),
                "biology".to_string(),
                "Photosynthesis happens in chloroplasts.".to_string(),
                0,
                vec![1.0, 0.0],
            )])
            .await
            .unwrap();
        let knowledge = Arc::new(KnowledgeBase::new(store, embedder));
        ToolContext::new(knowledge, 3, "https://example.com")
    }

    #[test]
    fn test_parse_doc_search_tool() {
        let tool = parse_tool_call("doc_search_tool", r#"{"query": "photosynthesis"}"#).unwrap();
        assert_eq!(
            tool,
            ToolCall::DocSearchTool {
                query: "photosynthesis".to_string()
            }
        );
        assert!(parse_tool_call("doc_search_tool", "{}").is_err());
    }

    #[test]
    fn test_parse_show_external_url() {
        assert_eq!(parse_tool_call("show_external_url", "").unwrap(), ToolCall::ShowExternalUrl);
        assert_eq!(parse_tool_call("show_external_url", "{}").unwrap(), ToolCall::ShowExternalUrl);
        assert!(parse_tool_call("generate_quiz", "{}").is_err());
    }

    #[test]
    fn test_tool_definitions_match_parser() {
        for tool in tool_definitions() {
            let args = if tool.function.name == "doc_search_tool" {
                r#"{"query": "x"}"#
            } else {
                "{}"
            };
            let parsed = parse_tool_call(&tool.function.name, args).unwrap();
            assert_eq!(parsed.name(), tool.function.name);
        }
    }

    #[tokio::test]
    async fn test_doc_search_formats_hits() {
        let ctx = context(Arc::new(KeywordEmbedder::new(&["photosynthesis", "volcano"]))).await;
        let output = ctx
            .execute(&ToolCall::DocSearchTool {
                query: " photosynthesis ".to_string(),
            })
            .await
            .unwrap();
        assert!(output.starts_with("📄 **Title:** biology\n📂 **Source:** knowledge-base/biology.txt"));
    }

    #[tokio::test]
    async fn test_doc_search_reports_failure_to_model() {
        let ctx = context(Arc::new(FailingEmbedder)).await;
        let output = ctx
            .execute(&ToolCall::DocSearchTool {
                query: "photosynthesis".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output, SEARCH_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_show_external_url() {
        let ctx = context(Arc::new(FailingEmbedder)).await;
        let output = ctx.execute(&ToolCall::ShowExternalUrl).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["type"], "resource");
        assert_eq!(value["resource"]["uri"], "ui://greeting");
        assert_eq!(value["resource"]["mimeType"], "text/uri-list");
        assert_eq!(value["resource"]["text"], "https://example.com");
        assert!(ToolCall::ShowExternalUrl.returns_resource());
    }
}
