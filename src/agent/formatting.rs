//! Formatting pass that turns a tutor reply into an envelope payload.
//!
//! The model is asked for JSON matching [`producer_schema`]. The parsed
//! reply is returned as a raw value; callers normalize it.

use crate::config::{FormattingPrompts, Prompts};
use crate::envelope::{producer_schema, SCHEMA_NAME};
use crate::error::{Result, StudyError};
use crate::openai::LlmClient;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Agent that structures a tutor reply as an `AgentResponse` payload.
pub struct FormattingAgent {
    client: LlmClient,
    model: String,
    prompts: FormattingPrompts,
}

impl FormattingAgent {
    pub fn new(client: LlmClient, model: &str, prompts: FormattingPrompts) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompts,
        }
    }

    /// Ask the model to format `answer`, offering the given UI resources.
    #[instrument(skip_all, fields(resources = resources.len()))]
    pub async fn format(&self, answer: &str, resources: &[Value]) -> Result<Value> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.system.clone())
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(self.user_message(answer, resources))
                .build()
                .map_err(|e| StudyError::Agent(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: SCHEMA_NAME.to_string(),
                    description: Some("A tutor reply split into text and UI resource parts".to_string()),
                    schema: Some(producer_schema()),
                    strict: None,
                },
            })
            .build()
            .map_err(|e| StudyError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| StudyError::OpenAI(format!("Formatting API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| StudyError::Agent("Formatting agent returned no content".to_string()))?;

        debug!("Formatting agent replied with {} bytes", content.len());
        parse_reply(&content)
    }

    fn user_message(&self, answer: &str, resources: &[Value]) -> String {
        let resources = if resources.is_empty() {
            "(none)".to_string()
        } else {
            resources
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut vars = HashMap::new();
        vars.insert("answer".to_string(), answer.to_string());
        vars.insert("resources".to_string(), resources);
        Prompts::render(&self.prompts.user, &vars)
    }
}

/// Parse the model's reply as JSON, accepting a fenced code block.
pub fn parse_reply(reply: &str) -> Result<Value> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim())
        .map_err(|e| StudyError::MalformedEnvelope(format!("formatting reply is not JSON: {}", e)))
}
