//! Study Mode - a retrieval-augmented tutor
//!
//! A tutoring service that answers study questions from a local knowledge
//! base and returns a structured response envelope of text and UI resource
//! parts.
//!
//! # Overview
//!
//! Study Mode allows you to:
//! - Index a directory of study notes into a vector store
//! - Ask questions of a tutor that guides rather than just answers
//! - Serve the tutor over HTTP, with every response validated
//! - Expose the tutor's tools and prompt over MCP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `envelope` - Response envelope types and the validator/normalizer
//! - `config` - Configuration management and prompts
//! - `knowledge` - Document loading, splitting, indexing and search
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `session` - Conversation history
//! - `agent` - Study agent, formatting agent and the responder
//! - `mcp` - MCP server
//! - `orchestrator` - Component wiring
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use studymode::envelope::{normalize, PartKind};
//!
//! let raw = json!({
//!     "content": "Let's start with fractions.",
//!     "parts": [{"type": "text", "text": "What is one half of four?"}]
//! });
//!
//! let envelope = normalize(&raw).unwrap();
//! assert_eq!(envelope.parts()[0].kind(), PartKind::Text);
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod envelope;
pub mod error;
pub mod knowledge;
pub mod mcp;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, StudyError};
