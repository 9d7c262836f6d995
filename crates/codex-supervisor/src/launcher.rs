//! Subprocess launch for agent invocations
//!
//! Starts the agent binary with piped stdout/stderr, registers its record,
//! and hands the child to the exit observer.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;

use crate::capture::pump;
use crate::config::SupervisorConfig;
use crate::error::{Result, SupervisorError};
use crate::lifecycle::observe_exit;
use crate::record::{AgentRecord, OutputStream};
use crate::registry::AgentRegistry;
use crate::types::AgentId;

/// Everything needed to launch one agent
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Instruction text, recorded for display
    pub task: String,
    /// Working directory; relative paths resolve against the current directory
    pub workdir: PathBuf,
    /// Model identifier, recorded for display
    pub model: String,
    /// Full argument list passed to the binary
    pub args: Vec<String>,
    /// Environment overrides on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl SpawnRequest {
    pub fn new(
        task: impl Into<String>,
        workdir: impl Into<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            workdir: workdir.into(),
            model: model.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Launch the configured binary and register the new agent
///
/// Must be called from within a tokio runtime. Nothing is registered when the
/// launch itself fails.
pub(crate) fn launch(
    config: &SupervisorConfig,
    registry: &AgentRegistry,
    request: SpawnRequest,
) -> Result<Arc<AgentRecord>> {
    let spawn_error = |source: std::io::Error| SupervisorError::Spawn {
        binary: config.binary.clone(),
        source,
    };

    let workdir = std::path::absolute(&request.workdir).map_err(spawn_error)?;
    if !workdir.is_dir() {
        return Err(spawn_error(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("working directory {} does not exist", workdir.display()),
        )));
    }

    let mut cmd = Command::new(&config.binary);
    cmd.args(&request.args)
        .current_dir(&workdir)
        .envs(request.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(spawn_error)?;
    let pid = child.id();

    let record = Arc::new(AgentRecord::new(
        AgentId::new(),
        request.task,
        workdir,
        request.model,
        pid,
        config.max_output_size,
    ));
    registry.insert(record.clone());

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(pump(stdout, record.clone(), OutputStream::Stdout)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(pump(stderr, record.clone(), OutputStream::Stderr)));
    }

    tokio::spawn(observe_exit(
        record.clone(),
        child,
        readers,
        config.drain_timeout,
    ));

    tracing::info!(
        agent_id = %record.id(),
        pid = ?pid,
        workdir = %record.workdir().display(),
        model = record.model(),
        "Spawned agent"
    );

    Ok(record)
}
