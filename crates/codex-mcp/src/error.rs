//! Error types for the MCP server

use codex_supervisor::SupervisorError;
use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during MCP server operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the agent supervisor
    #[error("{0}")]
    Supervisor(#[from] SupervisorError),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid tool arguments
    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Unknown tool requested
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Error::InvalidArguments {
            message: message.into(),
        }
    }

    /// JSON payload reported to the client when a tool call fails
    ///
    /// Always carries `error`; completion and timeout failures add the
    /// recorded exit code or the elapsed timeout.
    pub fn to_payload(&self) -> Value {
        let mut payload = json!({ "error": self.to_string() });
        match self {
            Error::Supervisor(SupervisorError::AlreadyCompleted { exit_code, .. }) => {
                payload["exit_code"] = json!(exit_code);
            }
            Error::Supervisor(SupervisorError::Timeout { timeout_ms, .. }) => {
                payload["timeout_ms"] = json!(timeout_ms);
            }
            _ => {}
        }
        payload
    }
}
