//! Core runtime: the MCP protocol loop and the HTTP invocation engine.

pub mod invoker;
pub mod mcp;
