//! Knowledge base indexing and retrieval.
//!
//! Documents under the knowledge-base directory are split into chunks,
//! embedded and stored in the vector store. Queries are embedded the same
//! way and matched by cosine similarity.

mod loader;
mod splitter;

pub use loader::{load_documents, SourceDocument};
pub use splitter::TextSplitter;

use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{Result, StudyError};
use crate::vector_store::{Document, SearchResult, VectorStore};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Embedding requests in flight at once while indexing.
const CONCURRENT_BATCHES: usize = 4;

/// Outcome of an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
}

/// Retrieval over the indexed knowledge base.
pub struct KnowledgeBase {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    min_score: f32,
    batch_size: usize,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            splitter: TextSplitter::new(900, 100),
            min_score: 0.0,
            batch_size: 100,
        }
    }

    /// Create a knowledge base configured from settings.
    pub fn from_settings(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &Settings,
    ) -> Self {
        Self::new(store, embedder)
            .with_splitter(TextSplitter::from_settings(&settings.knowledge))
            .with_min_score(settings.knowledge.min_score)
            .with_batch_size(settings.embedding.batch_size)
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Rebuild the index from every matching file under `dir`.
    ///
    /// The existing index is only cleared once every chunk has been embedded,
    /// so a wrong path or a failed embedding run leaves it untouched.
    #[instrument(skip(self, progress))]
    pub async fn build(&self, dir: &Path, extension: &str, progress: &ProgressBar) -> Result<IndexReport> {
        let sources = load_documents(dir, extension)?;
        if sources.is_empty() {
            return Err(StudyError::Knowledge(format!(
                "No .{} files found in {}",
                extension.trim_start_matches('.'),
                dir.display()
            )));
        }

        let mut pending: Vec<(String, String, String, i32)> = Vec::new();
        for source in &sources {
            for (order, chunk) in self.splitter.split(&source.content).into_iter().enumerate() {
                pending.push((source.source.clone(), source.page_title.clone(), chunk, order as i32));
            }
        }

        info!("Split {} documents into {} chunks", sources.len(), pending.len());
        progress.set_length(pending.len() as u64);

        let embedder = &self.embedder;
        let batches: Vec<Vec<Document>> = stream::iter(pending.chunks(self.batch_size))
            .map(|batch| async move {
                let texts: Vec<String> = batch.iter().map(|(_, _, text, _)| text.clone()).collect();
                let embeddings = embedder.embed_batch(&texts).await?;
                if embeddings.len() != batch.len() {
                    return Err(StudyError::Embedding(format!(
                        "Expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    )));
                }
                Ok(batch
                    .iter()
                    .zip(embeddings)
                    .map(|((source, title, text, order), embedding)| {
                        Document::new(source.clone(), title.clone(), text.clone(), *order, embedding)
                    })
                    .collect::<Vec<_>>())
            })
            .buffered(CONCURRENT_BATCHES)
            .inspect_ok(|docs| progress.inc(docs.len() as u64))
            .try_collect()
            .await?;

        let cleared = self.store.clear().await?;
        if cleared > 0 {
            info!("Cleared {} previously indexed chunks", cleared);
        }

        let mut chunks = 0;
        for docs in &batches {
            chunks += self.store.upsert_batch(docs).await?;
        }

        info!("Indexed {} chunks from {} documents", chunks, sources.len());
        Ok(IndexReport {
            documents: sources.len(),
            chunks,
        })
    }

    /// Return the `k` chunks most similar to the query.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query).await?;
        self.store
            .search_with_threshold(&embedding, k, self.min_score)
            .await
    }
}

/// Format search hits as the text handed to the model.
pub fn format_results(hits: &[SearchResult]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "📄 **Title:** {}\n📂 **Source:** {}\n\n{}",
                hit.document.page_title, hit.document.source, hit.document.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, KeywordEmbedder};
    use crate::vector_store::MemoryVectorStore;

    fn knowledge_base() -> KnowledgeBase {
        KnowledgeBase::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new(&["photosynthesis", "fractions", "volcano"])),
        )
        .with_splitter(TextSplitter::new(200, 20))
        .with_batch_size(1)
    }

    fn write_kb(dir: &Path) {
        std::fs::write(
            dir.join("biology.txt"),
            "Photosynthesis turns light into sugar. Photosynthesis happens in leaves.",
        )
        .unwrap();
        std::fs::write(dir.join("math.txt"), "Fractions describe parts of a whole.").unwrap();
        std::fs::write(dir.join("earth.txt"), "A volcano erupts when magma rises.").unwrap();
    }

    #[tokio::test]
    async fn test_build_and_search() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path());
        let kb = knowledge_base();

        let report = kb.build(dir.path(), "txt", &ProgressBar::hidden()).await.unwrap();
        assert_eq!(report, IndexReport { documents: 3, chunks: 3 });
        assert_eq!(kb.store().document_count().await.unwrap(), 3);

        let hits = kb.search("what are fractions", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.page_title, "math");
    }

    #[tokio::test]
    async fn test_rebuild_replaces_index() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path());
        let kb = knowledge_base();

        kb.build(dir.path(), "txt", &ProgressBar::hidden()).await.unwrap();
        std::fs::remove_file(dir.path().join("earth.txt")).unwrap();
        kb.build(dir.path(), "txt", &ProgressBar::hidden()).await.unwrap();

        assert_eq!(kb.store().document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_directory_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path());
        let kb = knowledge_base();
        kb.build(dir.path(), "txt", &ProgressBar::hidden()).await.unwrap();

        let empty = tempfile::tempdir().unwrap();
        let result = kb.build(empty.path(), "txt", &ProgressBar::hidden()).await;
        assert!(matches!(result, Err(StudyError::Knowledge(_))));
        assert_eq!(kb.store().document_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_embedding_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path());
        let kb = knowledge_base();
        kb.build(dir.path(), "txt", &ProgressBar::hidden()).await.unwrap();

        let failing = KnowledgeBase::new(kb.store().clone(), Arc::new(FailingEmbedder));
        let result = failing.build(dir.path(), "txt", &ProgressBar::hidden()).await;
        assert!(matches!(result, Err(StudyError::Embedding(_))));
        assert_eq!(kb.store().document_count().await.unwrap(), 3);
    }

    #[test]
    fn test_format_results() {
        let hit = |title: &str, content: &str| SearchResult {
            document: Document::new(
                format!("knowledge-base/{}.txt", title),
                title.to_string(),
                content.to_string(),
                0,
                Vec::new(),
            ),
            score: 0.9,
        };

        let text = format_results(&[hit("math", "Fractions."), hit("earth", "Volcanoes.")]);
        assert_eq!(
            text,
            "📄 **Title:** math\n📂 **Source:** knowledge-base/math.txt\n\nFractions.\n\n---\n\n\
             📄 **Title:** earth\n📂 **Source:** knowledge-base/earth.txt\n\nVolcanoes."
        );
        assert_eq!(format_results(&[]), "");
    }
}
