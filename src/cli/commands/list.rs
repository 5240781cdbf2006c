//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.vector_store().list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("Nothing indexed yet. Use 'studymode index' to index your notes.");
            } else {
                Output::header(&format!("Indexed Documents ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(&source.page_title, &source.source, source.chunk_count);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total documents", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
