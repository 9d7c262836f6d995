//! MCP Server for codex agents
//!
//! This crate exposes the [`codex_supervisor`] operations as Model Context
//! Protocol tools, so an MCP client can run `codex exec` agents in the
//! background, poll or wait for them, and stop them.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ codex-mcp (MCP Server) ]
//!        | (Rust API)
//!        v
//! [ codex-supervisor ]
//!        |
//!        +--> [ codex exec subprocesses ]
//! ```

pub mod command;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;

pub use command::ExecCommand;
pub use error::{Error, Result};
pub use server::CodexMcpServer;
pub use tools::{ToolContent, ToolDefinition, ToolResult, get_tool_definitions};
