//! Agent process supervisor for the codex CLI
//!
//! This crate launches agent subprocesses and tracks them for the life of the
//! supervisor process. It handles:
//!
//! - Launching the agent binary with piped output and registering the agent
//! - Capturing stdout/stderr under a per-stream byte ceiling
//! - Recording the exit exactly once and publishing the completion
//! - Waiting for completion with a timeout
//! - Terminating single agents and broadcasting termination on shutdown
//!
//! # Output and completion ordering
//!
//! An agent is marked completed only after both output pipes reach EOF, or
//! after [`SupervisorConfig::drain_timeout`] passes if something else (a
//! grandchild process) still holds them open. In that second case a completed
//! agent can still receive trailing output for a short while.
//!
//! # Truncation
//!
//! Once a stream exceeds its ceiling the buffer keeps the captured prefix,
//! gains [`TRUNCATION_MARKER`], and drops all later output from that stream.

mod capture;
pub mod config;
mod discovery;
pub mod error;
pub mod launcher;
mod lifecycle;
pub mod output;
pub mod record;
pub mod registry;
mod signal;
pub mod supervisor;
pub mod types;

pub use config::SupervisorConfig;
pub use error::{Result, SupervisorError};
pub use launcher::SpawnRequest;
pub use output::{DEFAULT_MAX_OUTPUT_SIZE, OutputBuffer, TRUNCATION_MARKER};
pub use record::{AgentRecord, OutputStream};
pub use registry::AgentRegistry;
pub use supervisor::Supervisor;
pub use types::{
    AgentId, AgentOutput, AgentStatus, AgentSummary, Availability, ExitOutcome, ListFilter,
    SpawnedAgent, TerminationAck, TerminationSignal,
};
