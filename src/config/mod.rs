//! Configuration module for Study Mode.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{FormattingPrompts, Prompts, StudyPrompts};
pub use settings::{
    AgentSettings, EmbeddingSettings, GeneralSettings, KnowledgeSettings, LlmSettings,
    PromptSettings, ServerSettings, SessionSettings, Settings, VectorStoreSettings,
};
