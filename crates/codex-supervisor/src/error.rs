//! Error types for supervisor operations

use std::path::PathBuf;

use crate::types::AgentId;

/// Errors that can occur while supervising agents
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// No agent is registered under the handle
    #[error("Agent {id} not found")]
    NotFound {
        /// The handle that was looked up
        id: String,
    },

    /// The agent has already exited
    #[error("Agent {id} already completed")]
    AlreadyCompleted {
        /// The agent handle
        id: AgentId,
        /// Exit code recorded when the agent finished
        exit_code: i32,
    },

    /// The agent did not complete within the requested time
    #[error("Timeout waiting for agent {id}")]
    Timeout {
        /// The agent handle
        id: AgentId,
        /// The timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// The agent binary could not be started
    #[error("Failed to spawn {}: {source}", binary.display())]
    Spawn {
        /// Binary that was invoked
        binary: PathBuf,
        /// Underlying launch failure
        #[source]
        source: std::io::Error,
    },

    /// The availability check did not run or exited non-zero
    #[error("{0}")]
    AvailabilityCheck(String),

    /// Delivering a signal to a running agent failed
    #[error("Failed to signal agent {id}: {source}")]
    Signal {
        /// The agent handle
        id: AgentId,
        /// OS error from signal delivery
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside of process launch
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;
