//! MCP tool definitions
//!
//! # Agent Lifecycle
//! - `spawn_agent` - Start one codex agent on a task
//! - `spawn_parallel_agents` - Start several agents at once
//! - `stop_agent` - Signal a running agent
//!
//! # Observation
//! - `list_agents` - Summaries of known agents
//! - `get_agent_output` - Captured output of one agent
//! - `wait_for_agent` - Block until an agent completes or a timeout passes
//!
//! # Environment
//! - `check_codex_available` - Probe the configured codex binary

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Default `wait_for_agent` timeout in milliseconds
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 300_000;

/// Tool definition for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result from a tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    /// Text of the first content item
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

fn reasoning_effort_schema(description: &str) -> serde_json::Value {
    json!({
        "type": "string",
        "enum": ["low", "medium", "high", "extra_high"],
        "description": description
    })
}

/// Get all available tool definitions
pub fn get_tool_definitions(default_model: &str) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "spawn_agent".to_string(),
            description: "Spawn a new codex agent to execute a task autonomously \
                          (approvals and sandbox bypassed)"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task": {
                        "type": "string",
                        "description": "The task/prompt for the codex agent to execute"
                    },
                    "workdir": {
                        "type": "string",
                        "description": "Working directory for the agent (defaults to current directory)"
                    },
                    "model": {
                        "type": "string",
                        "description": format!("Model to use (default: {default_model})")
                    },
                    "reasoning_effort": reasoning_effort_schema(
                        "How much the model should think before responding. \
                         low=fast, medium=balanced, high=more complete reasoning, \
                         extra_high=maximum thinking"
                    ),
                    "additional_flags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Additional codex CLI flags to pass"
                    },
                    "skip_git_check": {
                        "type": "boolean",
                        "description": "Skip git repository check (default: true)"
                    }
                },
                "required": ["task"]
            }),
        },
        ToolDefinition {
            name: "list_agents".to_string(),
            description: "List all active and completed codex agents".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "enum": ["all", "running", "completed"],
                        "description": "Filter agents by status (default: all)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_agent_output".to_string(),
            description: "Get the output (stdout/stderr) from a specific agent".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "The agent ID to query"
                    }
                },
                "required": ["agent_id"]
            }),
        },
        ToolDefinition {
            name: "stop_agent".to_string(),
            description: "Terminate a running codex agent".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "The agent ID to stop"
                    },
                    "signal": {
                        "type": "string",
                        "enum": ["SIGTERM", "SIGKILL"],
                        "description": "Signal to send (default: SIGTERM)"
                    }
                },
                "required": ["agent_id"]
            }),
        },
        ToolDefinition {
            name: "wait_for_agent".to_string(),
            description: "Wait for an agent to complete and return its final output".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "agent_id": {
                        "type": "string",
                        "description": "The agent ID to wait for"
                    },
                    "timeout": {
                        "type": "number",
                        "description": format!(
                            "Timeout in milliseconds (default: {DEFAULT_WAIT_TIMEOUT_MS} = 5 minutes)"
                        )
                    }
                },
                "required": ["agent_id"]
            }),
        },
        ToolDefinition {
            name: "spawn_parallel_agents".to_string(),
            description: "Spawn multiple codex agents in parallel for concurrent task execution"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "tasks": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "task": { "type": "string" },
                                "workdir": { "type": "string" },
                                "model": { "type": "string" },
                                "reasoning_effort": reasoning_effort_schema(
                                    "How much the model should think"
                                )
                            },
                            "required": ["task"]
                        },
                        "description": "Array of tasks to execute in parallel"
                    }
                },
                "required": ["tasks"]
            }),
        },
        ToolDefinition {
            name: "check_codex_available".to_string(),
            description: "Check if codex CLI is installed and available".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}
