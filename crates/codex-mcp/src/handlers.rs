//! MCP Tool Handlers
//!
//! Each handler decodes its arguments, calls into the [`Supervisor`] and
//! returns the JSON value reported back to the client.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use codex_supervisor::{AgentId, AgentStatus, ListFilter, Supervisor, TerminationSignal};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::command::ExecCommand;
use crate::tools::DEFAULT_WAIT_TIMEOUT_MS;
use crate::{Error, Result};

/// Handle a tool call by dispatching to the appropriate handler
pub async fn handle_tool_call(
    supervisor: &Supervisor,
    tool_name: &str,
    arguments: Value,
) -> Result<Value> {
    match tool_name {
        // Agent Lifecycle
        "spawn_agent" => handle_spawn_agent(supervisor, arguments),
        "spawn_parallel_agents" => handle_spawn_parallel_agents(supervisor, arguments),
        "stop_agent" => handle_stop_agent(supervisor, arguments),

        // Observation
        "list_agents" => handle_list_agents(supervisor, arguments),
        "get_agent_output" => handle_get_agent_output(supervisor, arguments),
        "wait_for_agent" => handle_wait_for_agent(supervisor, arguments).await,

        // Environment
        "check_codex_available" => handle_check_codex_available(supervisor).await,

        _ => Err(Error::UnknownTool(tool_name.to_string())),
    }
}

/// Decode tool arguments, treating a missing argument object as empty
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| Error::invalid_arguments(e.to_string()))
}

/// Resolve a requested working directory against the server's current one
fn resolve_workdir(workdir: Option<&str>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match workdir {
        Some(dir) => std::path::absolute(cwd.join(dir))?,
        None => cwd,
    })
}

fn parse_agent_id(raw: &str) -> Result<AgentId> {
    Ok(AgentId::from_str(raw)?)
}

// ============================================================================
// Agent Lifecycle Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpawnAgentArgs {
    task: String,
    workdir: Option<String>,
    model: Option<String>,
    reasoning_effort: Option<String>,
    #[serde(default)]
    additional_flags: Vec<String>,
    #[serde(default = "default_true")]
    skip_git_check: bool,
}

fn default_true() -> bool {
    true
}

/// Handle spawn_agent - Launch one agent
fn handle_spawn_agent(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: SpawnAgentArgs = parse_args(arguments)?;
    let workdir = resolve_workdir(args.workdir.as_deref())?;
    let model = args
        .model
        .unwrap_or_else(|| supervisor.config().default_model.clone());

    let command = ExecCommand::new(args.task, workdir, model)
        .reasoning_effort(args.reasoning_effort)
        .additional_flags(args.additional_flags)
        .skip_git_check(args.skip_git_check);
    let spawned = supervisor.spawn(command.into_request())?;

    Ok(json!({
        "agent_id": spawned.agent_id,
        "status": "spawned",
        "task": spawned.task,
        "workdir": spawned.workdir,
        "model": spawned.model,
        "started_at": spawned.started_at,
        "command": spawned.command,
    }))
}

#[derive(Debug, Deserialize)]
struct ParallelTask {
    task: String,
    workdir: Option<String>,
    model: Option<String>,
    reasoning_effort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpawnParallelArgs {
    tasks: Vec<ParallelTask>,
}

/// Handle spawn_parallel_agents - Launch several agents, skipping the git
/// check for all of them
///
/// A task that fails to launch does not stop the rest. Its index and error
/// are reported under `errors`, next to the ids of every agent that started.
fn handle_spawn_parallel_agents(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: SpawnParallelArgs = parse_args(arguments)?;

    let mut agent_ids = Vec::with_capacity(args.tasks.len());
    let mut errors = Vec::new();
    for (index, task) in args.tasks.into_iter().enumerate() {
        let description = task.task.clone();
        match spawn_parallel_task(supervisor, task) {
            Ok(agent_id) => agent_ids.push(agent_id),
            Err(e) => {
                tracing::warn!(task_index = index, error = %e, "Parallel task failed to launch");
                errors.push(json!({
                    "task_index": index,
                    "task": description,
                    "error": e.to_string(),
                }));
            }
        }
    }

    let mut result = json!({
        "spawned_count": agent_ids.len(),
        "agent_ids": agent_ids,
        "status": "parallel_execution_started",
    });
    if !errors.is_empty() {
        result["failed_count"] = json!(errors.len());
        result["errors"] = Value::Array(errors);
    }
    Ok(result)
}

fn spawn_parallel_task(supervisor: &Supervisor, task: ParallelTask) -> Result<AgentId> {
    let workdir = resolve_workdir(task.workdir.as_deref())?;
    let model = task
        .model
        .unwrap_or_else(|| supervisor.config().default_model.clone());
    let command = ExecCommand::new(task.task, workdir, model)
        .reasoning_effort(task.reasoning_effort)
        .skip_git_check(true);
    Ok(supervisor.spawn(command.into_request())?.agent_id)
}

#[derive(Debug, Deserialize)]
struct StopAgentArgs {
    agent_id: String,
    signal: Option<String>,
}

/// Handle stop_agent - Signal a running agent
fn handle_stop_agent(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: StopAgentArgs = parse_args(arguments)?;
    let id = parse_agent_id(&args.agent_id)?;
    let signal = match args.signal.as_deref() {
        Some(raw) => TerminationSignal::from_str(raw).map_err(Error::invalid_arguments)?,
        None => TerminationSignal::default(),
    };

    let ack = supervisor.terminate(&id, signal)?;
    Ok(json!({
        "agent_id": ack.agent_id,
        "status": "terminated",
        "signal": ack.signal,
    }))
}

// ============================================================================
// Observation Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListAgentsArgs {
    filter: Option<String>,
}

/// Handle list_agents - Summaries with counts
fn handle_list_agents(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: ListAgentsArgs = parse_args(arguments)?;
    let filter = match args.filter.as_deref() {
        Some(raw) => ListFilter::from_str(raw).map_err(Error::invalid_arguments)?,
        None => ListFilter::All,
    };

    let agents = supervisor.list(filter);
    let running = agents
        .iter()
        .filter(|a| a.status == AgentStatus::Running)
        .count();

    Ok(json!({
        "total": supervisor.agent_count(),
        "running": running,
        "completed": agents.len() - running,
        "agents": agents,
    }))
}

#[derive(Debug, Deserialize)]
struct AgentIdArgs {
    agent_id: String,
}

/// Handle get_agent_output - Current snapshot of one agent
fn handle_get_agent_output(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: AgentIdArgs = parse_args(arguments)?;
    let id = parse_agent_id(&args.agent_id)?;
    Ok(serde_json::to_value(supervisor.describe(&id)?)?)
}

#[derive(Debug, Deserialize)]
struct WaitForAgentArgs {
    agent_id: String,
    timeout: Option<f64>,
}

/// Handle wait_for_agent - Block until completion or timeout
async fn handle_wait_for_agent(supervisor: &Supervisor, arguments: Value) -> Result<Value> {
    let args: WaitForAgentArgs = parse_args(arguments)?;
    let id = parse_agent_id(&args.agent_id)?;
    let timeout = match args.timeout {
        Some(ms) if ms.is_finite() && ms >= 0.0 => Duration::from_millis(ms as u64),
        Some(ms) => {
            return Err(Error::invalid_arguments(format!("Invalid timeout: {ms}")));
        }
        None => Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
    };

    Ok(serde_json::to_value(supervisor.wait_for(&id, timeout).await?)?)
}

// ============================================================================
// Environment Handlers
// ============================================================================

/// Handle check_codex_available - Probe the configured binary
async fn handle_check_codex_available(supervisor: &Supervisor) -> Result<Value> {
    Ok(serde_json::to_value(supervisor.probe_availability().await)?)
}
