//! Embeddings for knowledge-base chunks and search queries.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns text into vectors comparable by cosine similarity.
///
/// Indexing embeds chunks with [`embed_batch`](Embedder::embed_batch);
/// `doc_search_tool` embeds the query with [`embed`](Embedder::embed).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one search query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of chunks, one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Length of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
