//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, StudyError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Indexing embeds every chunk through the hosted API.
    Index,
    /// Asking runs the agents through the hosted API.
    Ask,
    /// Search embeds the query.
    Search,
    /// Listing only reads the local store.
    List,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Index => {
            settings.api_key()?;
            check_knowledge_dir(settings)?;
        }
        Operation::Ask | Operation::Search => {
            settings.api_key()?;
        }
        Operation::List => {}
    }
    Ok(())
}

fn check_knowledge_dir(settings: &Settings) -> Result<()> {
    let dir = settings.knowledge_dir();
    if dir.is_dir() {
        Ok(())
    } else {
        Err(StudyError::Config(format!(
            "Knowledge base directory {} does not exist (set knowledge.input_dir or pass --input)",
            dir.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_has_no_requirements() {
        assert!(check(Operation::List, &Settings::default()).is_ok());
    }

    #[test]
    fn test_ask_requires_api_key() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "STUDYMODE_TEST_MISSING_KEY".to_string();
        assert!(matches!(check(Operation::Ask, &settings), Err(StudyError::Config(_))));
    }
}
