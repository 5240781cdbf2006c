//! Error types for Study Mode.

use thiserror::Error;

/// Library-level error type for Study Mode operations.
#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Schema violation in part {part}: {reason}")]
    SchemaViolation { part: usize, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Session store error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl StudyError {
    /// Shorthand for a schema violation at a given part index.
    pub fn schema(part: usize, reason: impl Into<String>) -> Self {
        StudyError::SchemaViolation {
            part,
            reason: reason.into(),
        }
    }

    /// Whether this error comes from envelope validation rather than a collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StudyError::MalformedEnvelope(_) | StudyError::SchemaViolation { .. }
        )
    }
}

/// Result type alias for Study Mode operations.
pub type Result<T> = std::result::Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_validation() {
        assert!(StudyError::schema(2, "missing 'kind'").is_validation());
        assert!(StudyError::MalformedEnvelope("missing 'parts'".to_string()).is_validation());
        assert!(!StudyError::Agent("model unavailable".to_string()).is_validation());
    }

    #[test]
    fn test_schema_violation_names_part() {
        let err = StudyError::schema(1, "text part has no text");
        assert_eq!(err.to_string(), "Schema violation in part 1: text part has no text");
    }
}
