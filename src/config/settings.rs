//! Configuration settings for Study Mode.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub knowledge: KnowledgeSettings,
    pub vector_store: VectorStoreSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.studymode".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Hosted LLM settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Chat model used by both the study agent and the formatting pass.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Texts per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "gemini-embedding-001".to_string(),
            dimensions: 768,
            batch_size: 100,
        }
    }
}

/// Knowledge base settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    /// Directory scanned for documents.
    pub input_dir: String,
    /// File extension of documents to load.
    pub extension: String,
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks returned per search.
    pub search_k: usize,
    /// Minimum similarity score for search hits.
    pub min_score: f32,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            input_dir: "knowledge-base".to_string(),
            extension: "txt".to_string(),
            chunk_size: 900,
            chunk_overlap: 100,
            search_k: 3,
            min_score: 0.0,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.studymode/vectors.db".to_string(),
        }
    }
}

/// Chat session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Path to the SQLite session database.
    pub sqlite_path: String,
    /// Messages replayed to the agent per request.
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.studymode/sessions.db".to_string(),
            max_history: 20,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Study agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum LLM calls per study agent run.
    pub max_iterations: usize,
    /// Timezone shown to the model in the study prompt.
    pub timezone: String,
    /// Knowledge cutoff shown to the model in the study prompt.
    pub knowledge_cutoff: String,
    /// URL embedded by the show_external_url tool.
    pub external_url: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            timezone: "Asia/Karachi".to_string(),
            knowledge_cutoff: "2025-01".to_string(),
            external_url: "https://example.com".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::StudyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that would otherwise fail deep inside a request.
    pub fn validate(&self) -> crate::error::Result<()> {
        url::Url::parse(&self.llm.base_url).map_err(|e| {
            crate::error::StudyError::Config(format!("Invalid llm.base_url '{}': {}", self.llm.base_url, e))
        })?;

        if self.knowledge.chunk_size == 0 {
            return Err(crate::error::StudyError::Config(
                "knowledge.chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(crate::error::StudyError::Config(format!(
                "knowledge.chunk_overlap ({}) must be smaller than knowledge.chunk_size ({})",
                self.knowledge.chunk_overlap, self.knowledge.chunk_size
            )));
        }

        Ok(())
    }

    /// Read the LLM API key from the configured environment variable.
    pub fn api_key(&self) -> crate::error::Result<String> {
        let name = &self.llm.api_key_env;
        match std::env::var(name) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(crate::error::StudyError::Config(format!("{} is empty", name))),
            Err(_) => Err(crate::error::StudyError::Config(format!(
                "{} is not set. Set it with: export {}='...'",
                name, name
            ))),
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studymode")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded knowledge base directory path.
    pub fn knowledge_dir(&self) -> PathBuf {
        Self::expand_path(&self.knowledge.input_dir)
    }

    /// Get the expanded vector database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded session database path.
    pub fn session_path(&self) -> PathBuf {
        Self::expand_path(&self.session.sqlite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.knowledge.chunk_size, 900);
        assert_eq!(settings.knowledge.chunk_overlap, 100);
        assert_eq!(settings.knowledge.search_k, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [llm]
            model = "gemini-2.5-pro"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(settings.llm.model, "gemini-2.5-pro");
        assert_eq!(settings.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut settings = Settings::default();
        settings.knowledge.chunk_overlap = 900;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut settings = Settings::default();
        settings.llm.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.agent.timezone = "Europe/Oslo".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.timezone, "Europe/Oslo");
    }

    #[test]
    fn test_missing_api_key_env() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "STUDYMODE_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(settings.api_key().is_err());
    }
}
