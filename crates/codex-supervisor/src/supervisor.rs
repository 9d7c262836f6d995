//! The agent supervisor
//!
//! [`Supervisor`] owns the registry and exposes the per-agent operations:
//! spawn, describe, list, wait, terminate, plus the process-wide shutdown
//! broadcast and the binary availability check.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SupervisorConfig;
use crate::discovery;
use crate::error::{Result, SupervisorError};
use crate::launcher::{SpawnRequest, launch};
use crate::registry::AgentRegistry;
use crate::types::{
    AgentId, AgentOutput, AgentSummary, Availability, ListFilter, SpawnedAgent, TerminationAck,
    TerminationSignal,
};

/// Supervises every agent spawned during the life of the process
///
/// Share it as `Arc<Supervisor>`; all operations take `&self`.
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
    registry: AgentRegistry,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            registry: AgentRegistry::new(),
        }
    }

    /// Convenience constructor returning a shareable handle
    pub fn shared(config: SupervisorConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Launch a new agent
    ///
    /// Returns as soon as the subprocess is started; it does not wait for any
    /// output. Must be called from within a tokio runtime.
    pub fn spawn(&self, request: SpawnRequest) -> Result<SpawnedAgent> {
        let command = std::iter::once(self.config.binary.display().to_string())
            .chain(request.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        let record = launch(&self.config, &self.registry, request)?;
        Ok(SpawnedAgent {
            agent_id: record.id(),
            task: record.task().to_string(),
            workdir: record.workdir().to_path_buf(),
            model: record.model().to_string(),
            started_at: record.started_at(),
            command,
        })
    }

    /// Current state and captured output of one agent
    pub fn describe(&self, id: &AgentId) -> Result<AgentOutput> {
        Ok(self.registry.get(id)?.output())
    }

    /// Summaries of every agent passing `filter`, oldest first
    pub fn list(&self, filter: ListFilter) -> Vec<AgentSummary> {
        self.registry
            .records()
            .iter()
            .map(|r| r.summary())
            .filter(|s| filter.matches(s.status))
            .collect()
    }

    /// Total number of agents ever spawned
    pub fn agent_count(&self) -> usize {
        self.registry.len()
    }

    /// Wait up to `timeout` for an agent to complete
    ///
    /// Returns immediately when the agent has already completed. On timeout
    /// the agent is left running.
    pub async fn wait_for(&self, id: &AgentId, timeout: Duration) -> Result<AgentOutput> {
        let record = self.registry.get(id)?;
        let mut completion = record.subscribe();

        // The sender lives inside the record we hold, so the channel cannot
        // close while waiting.
        let completed = tokio::time::timeout(timeout, completion.wait_for(Option::is_some))
            .await
            .is_ok();

        if completed {
            Ok(record.output())
        } else {
            Err(SupervisorError::Timeout {
                id: *id,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    /// Send `signal` to a running agent
    ///
    /// Does not wait for the agent to exit; the transition to COMPLETED is
    /// recorded by the exit observer once the process is gone.
    pub fn terminate(&self, id: &AgentId, signal: TerminationSignal) -> Result<TerminationAck> {
        let record = self.registry.get(id)?;
        record.signal(signal)?;
        tracing::info!(agent_id = %id, signal = %signal, "Sent termination signal");
        Ok(TerminationAck {
            agent_id: *id,
            signal,
        })
    }

    /// Ask every still-running agent to terminate
    ///
    /// Best effort: failures are logged and the remaining agents are still
    /// signalled. Returns how many agents were signalled. Does not wait for
    /// any of them to exit.
    pub fn shutdown(&self) -> usize {
        let mut signalled = 0;
        for record in self.registry.records() {
            if record.has_exited() {
                continue;
            }
            match record.signal(TerminationSignal::Term) {
                Ok(()) => signalled += 1,
                // Exited between the check and the signal
                Err(SupervisorError::AlreadyCompleted { .. }) => {}
                Err(e) => {
                    tracing::warn!(agent_id = %record.id(), error = %e, "Failed to stop agent during shutdown");
                }
            }
        }
        tracing::info!(signalled, "Shutdown broadcast sent");
        signalled
    }

    /// Check whether the configured binary runs
    pub async fn probe_availability(&self) -> Availability {
        discovery::probe_availability(&self.config.binary, self.config.version_timeout).await
    }
}
