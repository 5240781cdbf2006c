//! Study agent, formatting pass and the responder the HTTP boundary calls.
//!
//! A turn runs the study agent (which may search the knowledge base or
//! show an external page), then hands its answer to the formatting agent
//! for a structured payload. The payload is returned unnormalized; it is
//! only checked to decide whether the turn is kept in the session.

mod formatting;
mod runner;
mod tools;

pub use formatting::{parse_reply, FormattingAgent};
pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use tools::{
    parse_tool_call, tool_definitions, ToolCall, ToolContext, EXTERNAL_URL_URI, SEARCH_UNAVAILABLE,
};

use crate::config::{Prompts, Settings};
use crate::envelope::normalize;
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::openai::create_client;
use crate::session::{Role, SessionStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Produces the raw response payload for one user turn.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, query: &str, session_id: &str) -> Result<Value>;
}

/// The production responder.
pub struct Tutor {
    agent: Agent,
    formatter: FormattingAgent,
    sessions: Arc<SessionStore>,
    max_history: usize,
}

impl Tutor {
    pub fn new(agent: Agent, formatter: FormattingAgent, sessions: Arc<SessionStore>) -> Self {
        Self {
            agent,
            formatter,
            sessions,
            max_history: 20,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Wire up a tutor from settings.
    pub fn from_settings(
        settings: &Settings,
        prompts: &Prompts,
        knowledge: Arc<KnowledgeBase>,
        sessions: Arc<SessionStore>,
    ) -> Result<Self> {
        let client = create_client(settings)?;
        let tools = ToolContext::new(
            knowledge,
            settings.knowledge.search_k,
            &settings.agent.external_url,
        );

        let agent = Agent::new(
            client.clone(),
            tools,
            &settings.llm.model,
            &prompts.study_system(&settings.agent),
        )
        .with_max_iterations(settings.agent.max_iterations);

        let formatter = FormattingAgent::new(client, &settings.llm.model, prompts.formatting.clone());

        Ok(Self::new(agent, formatter, sessions).with_max_history(settings.session.max_history))
    }
}

#[async_trait]
impl Responder for Tutor {
    #[instrument(skip(self))]
    async fn respond(&self, query: &str, session_id: &str) -> Result<Value> {
        let history = self.sessions.history(session_id, self.max_history)?;

        let answer = self.agent.run(query, &history).await?;
        info!(
            "Study agent answered after {} iterations and {} tool calls",
            answer.iterations,
            answer.tool_calls.len()
        );

        let payload = self.formatter.format(&answer.content, &answer.resources()).await?;

        self.record_turn(session_id, query, &payload)?;

        Ok(payload)
    }
}

impl Tutor {
    /// Store the turn in the session, only if the payload normalizes.
    fn record_turn(&self, session_id: &str, query: &str, payload: &Value) -> Result<()> {
        match normalize(payload) {
            Ok(envelope) => {
                self.sessions.append(session_id, Role::User, query)?;
                self.sessions.append(session_id, Role::Assistant, envelope.content())
            }
            Err(e) => {
                warn!("Not recording turn for session {}: {}", session_id, e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormattingPrompts;
    use crate::openai::create_client_with_key;
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::MemoryVectorStore;
    use serde_json::json;
    use std::time::Duration;

    fn tutor(sessions: Arc<SessionStore>) -> Tutor {
        let client = create_client_with_key("http://localhost:1", "test", Duration::from_secs(1)).unwrap();
        let knowledge = Arc::new(KnowledgeBase::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&["cells"])),
        ));
        let agent = Agent::new(
            client.clone(),
            ToolContext::new(knowledge, 3, "https://example.com"),
            "gemini-2.5-flash",
            "You are a tutor.",
        );
        let formatter = FormattingAgent::new(client, "gemini-2.5-flash", FormattingPrompts::default());
        Tutor::new(agent, formatter, sessions)
    }

    #[test]
    fn test_valid_turn_is_recorded() {
        let sessions = Arc::new(SessionStore::in_memory().unwrap());
        let tutor = tutor(sessions.clone());

        let payload = json!({
            "content": "Let's look at cells.",
            "parts": [{"type": "text", "text": "What do you know about cells?"}]
        });
        tutor.record_turn("s1", "cells", &payload).unwrap();

        let history = sessions.history("s1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "cells");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "Let's look at cells.");
    }

    #[test]
    fn test_rejected_turn_is_not_recorded() {
        let sessions = Arc::new(SessionStore::in_memory().unwrap());
        let tutor = tutor(sessions.clone());

        let payload = json!({
            "content": "Here you go",
            "parts": [{"type": "ui-resource", "resource": null}]
        });
        tutor.record_turn("s1", "cells", &payload).unwrap();

        assert!(sessions.history("s1", 10).unwrap().is_empty());
    }
}
