//! Index command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(input: Option<String>, mut settings: Settings) -> Result<()> {
    if let Some(dir) = input {
        settings.knowledge.input_dir = dir;
    }

    if let Err(e) = preflight::check(Operation::Index, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let dir = settings.knowledge_dir();
    let extension = settings.knowledge.extension.clone();
    let orchestrator = Orchestrator::new(settings)?;
    let knowledge = orchestrator.knowledge()?;

    Output::info(&format!("Indexing {}", dir.display()));
    let progress = Output::progress_bar(0, "chunks embedded");

    let result = knowledge.build(&dir, &extension, &progress).await;
    progress.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} chunks from {} documents",
                report.chunks, report.documents
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Indexing failed: {}", e));
            Err(e.into())
        }
    }
}
