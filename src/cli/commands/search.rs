//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, k: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let k = k.unwrap_or(settings.knowledge.search_k);
    let orchestrator = Orchestrator::new(settings)?;
    let knowledge = orchestrator.knowledge()?;

    let spinner = Output::spinner("Searching...");
    let results = knowledge.search(query, k).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found. Has the knowledge base been indexed?");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in &hits {
                Output::search_result(
                    &hit.document.page_title,
                    &hit.document.source,
                    hit.score,
                    &hit.document.content,
                );
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
