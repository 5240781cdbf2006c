//! Study agent with a tool calling loop.

use super::tools::{parse_tool_call, tool_definitions, ToolContext};
use crate::error::{Result, StudyError};
use crate::openai::LlmClient;
use crate::session::{Role, SessionMessage};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use tracing::{debug, info};

/// Agent that tutors the user, searching the knowledge base as needed.
pub struct Agent {
    client: LlmClient,
    model: String,
    tools: ToolContext,
    max_iterations: usize,
    system_prompt: String,
}

impl Agent {
    pub fn new(client: LlmClient, tools: ToolContext, model: &str, system_prompt: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            tools,
            max_iterations: 15,
            system_prompt: system_prompt.to_string(),
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Build the opening messages: system prompt, prior turns, then the query.
    fn initial_messages(&self, query: &str, history: &[SessionMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?
                .into(),
        ];

        for message in history {
            let built: ChatCompletionRequestMessage = match message.role {
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| StudyError::Agent(e.to_string()))?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()
                    .map_err(|e| StudyError::Agent(e.to_string()))?
                    .into(),
            };
            messages.push(built);
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(query.to_string())
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?
                .into(),
        );

        Ok(messages)
    }

    /// Run the agent on a user query with prior conversation turns.
    pub async fn run(&self, query: &str, history: &[SessionMessage]) -> Result<AgentResponse> {
        let mut messages = self.initial_messages(query, history)?;
        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(StudyError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let request = CreateChatCompletionRequestArgs::default()
                .model(&self.model)
                .messages(messages.clone())
                .tools(tool_definitions())
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .map_err(|e| StudyError::OpenAI(format!("Agent API error: {}", e)))?;

            let choice = response
                .choices
                .first()
                .ok_or_else(|| StudyError::Agent("No response from model".to_string()))?;

            let tool_calls = match choice.message.tool_calls {
                Some(ref calls) if !calls.is_empty() => calls,
                _ => return Ok(build_response(&choice.message.content, tool_calls_made, iterations)),
            };

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in tool_calls {
                let record = self.execute_tool_call(tool_call).await;

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(record.result.clone())
                    .build()
                    .map_err(|e| StudyError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());

                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent calling tool: {} with args: {}", name, arguments);

        let (result, is_resource) = match parse_tool_call(name, arguments) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => (output, tool.returns_resource()),
                Err(e) => (format!("Tool error: {}", e), false),
            },
            Err(e) => (format!("Failed to parse tool call: {}", e), false),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
            is_resource,
        }
    }
}

fn build_response(content: &Option<String>, tool_calls: Vec<ToolCallRecord>, iterations: usize) -> AgentResponse {
    AgentResponse {
        content: content.clone().unwrap_or_default(),
        tool_calls,
        iterations,
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

impl AgentResponse {
    /// UI resources returned by tools during the run.
    pub fn resources(&self) -> Vec<serde_json::Value> {
        self.tool_calls
            .iter()
            .filter(|record| record.is_resource)
            .filter_map(|record| serde_json::from_str(&record.result).ok())
            .collect()
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
    /// Whether `result` is a serialized UI resource.
    pub is_resource: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, result: &str, is_resource: bool) -> ToolCallRecord {
        ToolCallRecord {
            name: name.to_string(),
            arguments: "{}".to_string(),
            result: result.to_string(),
            is_resource,
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        let mut r = record("doc_search_tool", "Found results", false);
        r.arguments = r#"{"query": "cells"}"#.to_string();
        assert_eq!(format!("{}", r), r#"doc_search_tool({"query": "cells"})"#);
    }

    #[test]
    fn test_resources_only_from_resource_tools() {
        let response = AgentResponse {
            content: "answer".to_string(),
            tool_calls: vec![
                record("doc_search_tool", "📄 **Title:** notes", false),
                record("show_external_url", r#"{"type":"resource","resource":{"uri":"ui://greeting"}}"#, true),
                record("show_external_url", "not json", true),
            ],
            iterations: 2,
        };

        let resources = response.resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0]["resource"]["uri"], "ui://greeting");
    }

    #[test]
    fn test_build_response_defaults_empty_content() {
        let response = build_response(&None, Vec::new(), 1);
        assert_eq!(response.content, "");
        assert_eq!(response.iterations, 1);
    }
}
