//! Shared types for supervisor operations

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SupervisorError;

/// Opaque handle identifying one spawned agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Generate a fresh random handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AgentId {
    type Err = SupervisorError;

    /// A string that is not a valid handle can never name a registered agent,
    /// so parse failures are reported as `NotFound`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| SupervisorError::NotFound { id: s.to_string() })
    }
}

/// Derived lifecycle state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Subprocess has not been observed to exit
    Running,
    /// Subprocess exited; terminal
    Completed,
}

/// Status filter for listing agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    Running,
    Completed,
}

impl ListFilter {
    /// Whether an agent in `status` passes this filter
    pub fn matches(self, status: AgentStatus) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Running => status == AgentStatus::Running,
            ListFilter::Completed => status == AgentStatus::Completed,
        }
    }
}

impl FromStr for ListFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ListFilter::All),
            "running" => Ok(ListFilter::Running),
            "completed" => Ok(ListFilter::Completed),
            other => Err(format!("Invalid filter: {other}")),
        }
    }
}

/// Signal sent to terminate an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationSignal {
    /// Graceful termination request
    #[default]
    #[serde(rename = "SIGTERM")]
    Term,
    /// Forced kill
    #[serde(rename = "SIGKILL")]
    Kill,
}

impl TerminationSignal {
    /// Conventional signal name
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationSignal::Term => "SIGTERM",
            TerminationSignal::Kill => "SIGKILL",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminationSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIGTERM" | "TERM" => Ok(TerminationSignal::Term),
            "SIGKILL" | "KILL" => Ok(TerminationSignal::Kill),
            other => Err(format!("Unsupported signal: {other}")),
        }
    }
}

/// How an agent subprocess ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitOutcome {
    /// Process exit code; `128 + signal` when the process was killed by a signal
    pub code: i32,
    /// Raw signal number when the process was terminated by a signal
    pub signal: Option<i32>,
}

impl ExitOutcome {
    /// Shell-style code used when a process dies from a signal
    pub fn from_signal(signal: i32) -> Self {
        Self {
            code: 128 + signal,
            signal: Some(signal),
        }
    }
}

/// List entry for one agent, without buffered output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent_id: AgentId,
    pub task: String,
    pub workdir: PathBuf,
    pub model: String,
    pub status: AgentStatus,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub runtime_seconds: f64,
}

/// Point-in-time view of an agent including its captured output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    pub agent_id: AgentId,
    pub task: String,
    pub workdir: PathBuf,
    pub model: String,
    pub status: AgentStatus,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub runtime_seconds: f64,
}

/// Details of a freshly spawned agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnedAgent {
    pub agent_id: AgentId,
    pub task: String,
    pub workdir: PathBuf,
    pub model: String,
    pub started_at: DateTime<Utc>,
    /// Command line as launched, for display
    pub command: String,
}

/// Acknowledgment that a termination signal was delivered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationAck {
    pub agent_id: AgentId,
    pub signal: TerminationSignal,
}

/// Result of probing the configured agent binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,
    pub binary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Seconds elapsed between two instants, at millisecond resolution
pub(crate) fn runtime_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0
}
