//! OpenAI-compatible client configuration.
//!
//! The hosted Gemini API exposes an OpenAI-compatible endpoint, so the same
//! client drives chat completions and embeddings.

use crate::config::Settings;
use crate::error::{Result, StudyError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Client type used throughout the crate.
pub type LlmClient = Client<OpenAIConfig>;

/// Create a client from settings, reading the API key from the environment.
pub fn create_client(settings: &Settings) -> Result<LlmClient> {
    let api_key = settings.api_key()?;
    create_client_with_key(
        &settings.llm.base_url,
        &api_key,
        Duration::from_secs(settings.llm.timeout_secs),
    )
}

/// Create a client with an explicit base URL, key and timeout.
pub fn create_client_with_key(base_url: &str, api_key: &str, timeout: Duration) -> Result<LlmClient> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| StudyError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
