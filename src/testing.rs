//! Test doubles for the hosted services.

use crate::agent::Responder;
use crate::embedding::Embedder;
use crate::error::{Result, StudyError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// Embeds text as word counts over a fixed vocabulary.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        self.vocabulary
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }
}

/// An embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(StudyError::Embedding("service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(StudyError::Embedding("service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Responder that replays a fixed reply and records what it was asked.
pub struct ScriptedResponder {
    reply: std::result::Result<Value, String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedResponder {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply: Ok(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, query: &str, session_id: &str) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), session_id.to_string()));
        self.reply.clone().map_err(StudyError::Agent)
    }
}
