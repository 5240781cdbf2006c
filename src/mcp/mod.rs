//! MCP (Model Context Protocol) server for Study Mode.
//!
//! Exposes the study agent's tools and the study prompt to other MCP
//! clients. Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
