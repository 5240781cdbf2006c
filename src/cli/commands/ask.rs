//! Ask command implementation.

use crate::agent::Responder;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::envelope::normalize;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command, printing the validated envelope as JSON.
pub async fn run_ask(query: &str, session: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let tutor = orchestrator.tutor()?;

    let spinner = Output::spinner("Thinking...");
    let result = tutor.respond(query, session).await;
    spinner.finish_and_clear();

    let raw = match result {
        Ok(raw) => raw,
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    };

    match normalize(&raw) {
        Ok(envelope) => {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("The formatting agent returned an invalid response: {}", e));
            Err(e.into())
        }
    }
}
