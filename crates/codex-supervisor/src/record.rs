//! Tracked state for one agent subprocess

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::{Result, SupervisorError};
use crate::output::OutputBuffer;
use crate::signal;
use crate::types::{
    AgentId, AgentOutput, AgentStatus, AgentSummary, ExitOutcome, TerminationSignal,
    runtime_seconds,
};

/// Which captured stream a chunk belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// Mutable part of a record, guarded by one lock
#[derive(Debug)]
struct RecordState {
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    /// Set as soon as the process has been reaped, before output is drained
    reaped: Option<ExitOutcome>,
    exit: Option<ExitOutcome>,
    finished_at: Option<DateTime<Utc>>,
}

/// One spawned agent
///
/// Identity fields are fixed at spawn. The exit outcome and finish time are
/// written together, once, by the exit observer; after that the record is
/// COMPLETED for good.
#[derive(Debug)]
pub struct AgentRecord {
    id: AgentId,
    task: String,
    workdir: PathBuf,
    model: String,
    started_at: DateTime<Utc>,
    /// OS process id of the live subprocess
    pid: Option<u32>,
    state: Mutex<RecordState>,
    completion: watch::Sender<Option<ExitOutcome>>,
}

impl AgentRecord {
    pub(crate) fn new(
        id: AgentId,
        task: String,
        workdir: PathBuf,
        model: String,
        pid: Option<u32>,
        max_output_size: usize,
    ) -> Self {
        let (completion, _) = watch::channel(None);
        Self {
            id,
            task,
            workdir,
            model,
            started_at: Utc::now(),
            pid,
            state: Mutex::new(RecordState {
                stdout: OutputBuffer::new(max_output_size),
                stderr: OutputBuffer::new(max_output_size),
                reaped: None,
                exit: None,
                finished_at: None,
            }),
            completion,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk of output to one of the stream buffers
    pub(crate) fn append(&self, stream: OutputStream, chunk: &str) {
        let mut state = self.lock();
        match stream {
            OutputStream::Stdout => state.stdout.append(chunk),
            OutputStream::Stderr => state.stderr.append(chunk),
        }
    }

    /// Note that the process has been reaped and its pid may be reused
    ///
    /// The record stays RUNNING until [`complete`](Self::complete); this only
    /// stops further signals from reaching the pid.
    pub(crate) fn mark_reaped(&self, outcome: ExitOutcome) {
        self.lock().reaped.get_or_insert(outcome);
    }

    /// Whether the process is gone, even if output is still draining
    pub fn has_exited(&self) -> bool {
        let state = self.lock();
        state.exit.or(state.reaped).is_some()
    }

    /// Record the exit outcome and finish time
    ///
    /// Only the first call has any effect; returns whether this call
    /// performed the transition.
    pub(crate) fn complete(&self, outcome: ExitOutcome) -> bool {
        {
            let mut state = self.lock();
            if state.exit.is_some() {
                return false;
            }
            state.reaped.get_or_insert(outcome);
            state.exit = Some(outcome);
            state.finished_at = Some(Utc::now());
        }
        self.completion.send_replace(Some(outcome));
        true
    }

    /// Exit outcome, once the agent has completed
    pub fn exit_outcome(&self) -> Option<ExitOutcome> {
        self.lock().exit
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.lock().finished_at
    }

    pub fn status(&self) -> AgentStatus {
        if self.lock().exit.is_some() {
            AgentStatus::Completed
        } else {
            AgentStatus::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == AgentStatus::Running
    }

    /// Receiver that observes the completion transition
    pub fn subscribe(&self) -> watch::Receiver<Option<ExitOutcome>> {
        self.completion.subscribe()
    }

    /// Send `sig` to the subprocess if it is still running
    ///
    /// The check and the delivery happen under the record lock, so a signal
    /// is never sent once the process has been reaped, including while its
    /// output is still draining.
    pub fn signal(&self, sig: TerminationSignal) -> Result<()> {
        let state = self.lock();
        if let Some(exit) = state.exit.or(state.reaped) {
            return Err(SupervisorError::AlreadyCompleted {
                id: self.id,
                exit_code: exit.code,
            });
        }
        let Some(pid) = self.pid else {
            return Err(SupervisorError::Signal {
                id: self.id,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "subprocess has no process id",
                ),
            });
        };
        signal::send(pid, sig).map_err(|source| SupervisorError::Signal {
            id: self.id,
            source,
        })
    }

    /// Summary view without buffer contents
    pub fn summary(&self) -> AgentSummary {
        let state = self.lock();
        AgentSummary {
            agent_id: self.id,
            task: self.task.clone(),
            workdir: self.workdir.clone(),
            model: self.model.clone(),
            status: status_of(&state),
            exit_code: state.exit.map(|e| e.code),
            exit_signal: state.exit.and_then(|e| e.signal),
            started_at: self.started_at,
            finished_at: state.finished_at,
            runtime_seconds: self.runtime(&state),
        }
    }

    /// Full view including captured output
    pub fn output(&self) -> AgentOutput {
        let state = self.lock();
        AgentOutput {
            agent_id: self.id,
            task: self.task.clone(),
            workdir: self.workdir.clone(),
            model: self.model.clone(),
            status: status_of(&state),
            exit_code: state.exit.map(|e| e.code),
            exit_signal: state.exit.and_then(|e| e.signal),
            stdout: state.stdout.content().to_string(),
            stderr: state.stderr.content().to_string(),
            stdout_truncated: state.stdout.is_truncated(),
            stderr_truncated: state.stderr.is_truncated(),
            started_at: self.started_at,
            finished_at: state.finished_at,
            runtime_seconds: self.runtime(&state),
        }
    }

    /// Finished records measure to their finish time, running ones to now
    fn runtime(&self, state: &RecordState) -> f64 {
        let end = state.finished_at.unwrap_or_else(Utc::now);
        runtime_seconds(self.started_at, end)
    }
}

fn status_of(state: &RecordState) -> AgentStatus {
    if state.exit.is_some() {
        AgentStatus::Completed
    } else {
        AgentStatus::Running
    }
}
