//! CLI module for Study Mode.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Study Mode - a retrieval-augmented tutor
///
/// Indexes a directory of study notes and answers questions as a patient
/// tutor, returning structured responses of text and UI resource parts.
#[derive(Parser, Debug)]
#[command(name = "studymode")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index the knowledge-base directory, replacing the previous index
    Index {
        /// Directory to index (defaults to knowledge.input_dir)
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Ask the tutor a question and print the response envelope
    Ask {
        /// The question to ask
        query: String,

        /// Session to continue
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// Search the knowledge base
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (defaults to knowledge.search_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// List indexed documents
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start the MCP server over stdio
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["studymode", "-v", "ask", "What is osmosis?", "--session", "s1"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ask { query, session } => {
                assert_eq!(query, "What is osmosis?");
                assert_eq!(session, "s1");
            }
            other => panic!("Expected Ask, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_and_serve() {
        let cli = Cli::parse_from(["studymode", "search", "cells", "-k", "5"]);
        assert!(matches!(cli.command, Commands::Search { k: Some(5), .. }));

        let cli = Cli::parse_from(["studymode", "serve", "--port", "9000"]);
        assert!(matches!(cli.command, Commands::Serve { host: None, port: Some(9000) }));
    }
}
