//! Toolbridge - configuration-driven REST-to-MCP gateway
//!
//! Operators describe REST endpoints declaratively in a catalog file
//! (name, method, endpoint, templates, parameter schema); toolbridge
//! exposes them as callable MCP tools over a line-oriented JSON-RPC
//! stream, and over a parallel REST control surface backed by the same
//! invocation engine.

pub mod cli;
pub mod config;
pub mod core;
pub mod rest;
pub mod template;

pub use config::{Catalog, CatalogError, ToolConfig};
pub use core::invoker::{InvokeResult, Invoker};
pub use core::mcp::McpServer;
