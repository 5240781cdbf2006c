//! Wiring for Study Mode.
//!
//! Builds the knowledge base, session store and tutor from settings, so
//! every entry point (CLI, HTTP, MCP) assembles them the same way.

use crate::agent::{ToolContext, Tutor};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::openai::create_client;
use crate::session::SessionStore;
use crate::vector_store::{self, VectorStore};
use std::sync::Arc;
use tracing::info;

/// Owns the long-lived components shared by the entry points.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Open the vector store and load prompts. No API key is needed yet.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let vector_store = vector_store::open(&settings)?;
        info!("Using {} vector store", settings.vector_store.provider);

        Ok(Self {
            settings,
            prompts,
            vector_store,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        Arc::clone(&self.vector_store)
    }

    /// Build the knowledge base with the hosted embedder.
    pub fn knowledge(&self) -> Result<Arc<KnowledgeBase>> {
        let client = create_client(&self.settings)?;
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(client, &self.settings.embedding));

        Ok(Arc::new(KnowledgeBase::from_settings(
            self.vector_store(),
            embedder,
            &self.settings,
        )))
    }

    /// Tools as exposed to the agent and over MCP.
    pub fn tool_context(&self) -> Result<ToolContext> {
        Ok(ToolContext::new(
            self.knowledge()?,
            self.settings.knowledge.search_k,
            &self.settings.agent.external_url,
        ))
    }

    /// Build the production tutor with its session store.
    pub fn tutor(&self) -> Result<Tutor> {
        let sessions = Arc::new(SessionStore::new(&self.settings.session_path())?);
        Tutor::from_settings(&self.settings, &self.prompts, self.knowledge()?, sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_api_key() {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        settings.llm.api_key_env = "STUDYMODE_TEST_UNSET_KEY".to_string();

        let orchestrator = Orchestrator::new(settings).unwrap();
        assert_eq!(orchestrator.prompts().study.name, "prompt-v1");
        assert!(orchestrator.knowledge().is_err());
    }
}
