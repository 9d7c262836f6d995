//! MCP Protocol Compliance Integration Tests
//!
//! Tests that the MCP server correctly implements JSON-RPC 2.0 and MCP
//! protocol requirements, including ID preservation, error codes, and
//! end-to-end tool execution against a fake codex binary.

use codex_mcp::CodexMcpServer;
use codex_supervisor::{Supervisor, SupervisorConfig};
use serde_json::{Value, json};

fn setup_server(binary: &std::path::Path) -> CodexMcpServer {
    CodexMcpServer::new(Supervisor::shared(
        SupervisorConfig::with_binary(binary).drain_timeout(std::time::Duration::from_millis(500)),
    ))
}

fn offline_server() -> CodexMcpServer {
    setup_server(std::path::Path::new("/nonexistent/codex"))
}

async fn send(server: &CodexMcpServer, request: &str) -> Value {
    let response = server
        .handle_message(request)
        .await
        .expect("request with an id must get a response");
    serde_json::to_value(response).unwrap()
}

/// Call a tool and decode its JSON text payload
async fn call_tool(server: &CodexMcpServer, name: &str, arguments: Value) -> (Value, bool) {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    });
    let response = send(server, &request.to_string()).await;
    assert!(response.get("error").is_none(), "unexpected error: {response}");

    let result = &response["result"];
    let is_error = result["isError"].as_bool().unwrap_or(false);
    let text = result["content"][0]["text"].as_str().unwrap();
    (serde_json::from_str(text).unwrap(), is_error)
}

// ==========================================================================
// JSON-RPC 2.0 ID Preservation
// ==========================================================================

#[tokio::test]
async fn test_numeric_id_preserved_in_response() {
    let server = offline_server();

    let request = r#"{"jsonrpc":"2.0","id":42,"method":"initialize","params":{}}"#;
    let response = send(&server, request).await;

    assert_eq!(response["id"], 42, "Numeric ID must be echoed back exactly");
    assert_eq!(response["jsonrpc"], "2.0");
}

#[tokio::test]
async fn test_string_id_preserved_in_response() {
    let server = offline_server();

    let request = r#"{"jsonrpc":"2.0","id":"req-abc-123","method":"tools/list"}"#;
    let response = send(&server, request).await;

    assert_eq!(
        response["id"], "req-abc-123",
        "String ID must be echoed back exactly"
    );
}

#[tokio::test]
async fn test_id_preserved_in_error_response() {
    let server = offline_server();

    let request = r#"{"jsonrpc":"2.0","id":"err-test","method":"nonexistent/method","params":{}}"#;
    let response = send(&server, request).await;

    assert_eq!(response["id"], "err-test");
    assert!(response.get("error").is_some());
}

// ==========================================================================
// Error Codes
// ==========================================================================

#[tokio::test]
async fn test_method_not_found_returns_32601() {
    let server = offline_server();

    let response = send(&server, r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#).await;

    assert_eq!(response["error"]["code"], -32601);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("resources/list")
    );
}

#[tokio::test]
async fn test_invalid_json_returns_parse_error() {
    let server = offline_server();

    let response = send(&server, "not json at all").await;

    assert_eq!(response["error"]["code"], -32700);
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_missing_method_field_is_parse_error() {
    let server = offline_server();

    let response = send(&server, r#"{"jsonrpc":"2.0","id":1}"#).await;

    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn test_invalid_params_for_tools_call_returns_error() {
    let server = offline_server();

    let request = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"arguments":{}}}"#;
    let response = send(&server, request).await;

    assert_eq!(response["error"]["code"], -32602);
}

// ==========================================================================
// Initialize and Notifications
// ==========================================================================

#[tokio::test]
async fn test_initialize_returns_server_info_and_capabilities() {
    let server = offline_server();

    let request = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#;
    let result = send(&server, request).await["result"].clone();

    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "codex-mcp");
    assert_eq!(result["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_initialized_notifications_return_nothing() {
    let server = offline_server();

    for request in [
        r#"{"jsonrpc":"2.0","method":"initialized"}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
    ] {
        assert!(server.handle_message(request).await.is_none());
    }
}

// ==========================================================================
// Tools
// ==========================================================================

#[tokio::test]
async fn test_tools_list_returns_all_defined_tools() {
    let server = offline_server();

    let response = send(&server, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await;
    let mut names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "check_codex_available",
            "get_agent_output",
            "list_agents",
            "spawn_agent",
            "spawn_parallel_agents",
            "stop_agent",
            "wait_for_agent",
        ]
    );
}

#[tokio::test]
async fn test_tool_call_unknown_tool_returns_is_error() {
    let server = offline_server();

    let (payload, is_error) = call_tool(&server, "does_not_exist", json!({})).await;

    assert!(is_error);
    assert_eq!(payload["error"], "Unknown tool: does_not_exist");
}

#[tokio::test]
async fn test_tool_call_unknown_agent_returns_not_found() {
    let server = offline_server();

    for tool in ["get_agent_output", "stop_agent", "wait_for_agent"] {
        let (payload, is_error) = call_tool(&server, tool, json!({ "agent_id": "ghost" })).await;
        assert!(is_error, "{tool}");
        assert_eq!(payload["error"], "Agent ghost not found", "{tool}");
    }
}

#[tokio::test]
async fn test_spawn_failure_registers_nothing() {
    let server = offline_server();

    let (payload, is_error) = call_tool(&server, "spawn_agent", json!({ "task": "t" })).await;
    assert!(is_error);
    assert!(payload["error"].as_str().unwrap().contains("Failed to spawn"));

    let (list, _) = call_tool(&server, "list_agents", json!({})).await;
    assert_eq!(list["total"], 0);
}

#[cfg(unix)]
mod with_fake_codex {
    use super::*;
    use std::sync::Arc;

    use codex_supervisor::TRUNCATION_MARKER;
    use codex_test_utils::FakeCodex;

    fn server_for(fake: &FakeCodex) -> CodexMcpServer {
        setup_server(fake.path())
    }

    async fn spawn(server: &CodexMcpServer, arguments: Value) -> String {
        let (payload, is_error) = call_tool(server, "spawn_agent", arguments).await;
        assert!(!is_error, "spawn failed: {payload}");
        payload["agent_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_spawn_then_wait_reports_output() {
        let fake = FakeCodex::builder().stdout("A").build();
        let server = server_for(&fake);

        let (spawned, is_error) = call_tool(
            &server,
            "spawn_agent",
            json!({ "task": "say A", "workdir": fake.dir() }),
        )
        .await;
        assert!(!is_error);
        assert_eq!(spawned["status"], "spawned");
        assert_eq!(spawned["task"], "say A");
        assert_eq!(spawned["model"], "o3");
        assert!(spawned["started_at"].is_string());
        assert!(
            spawned["command"]
                .as_str()
                .unwrap()
                .starts_with(&fake.path().display().to_string())
        );

        let (done, is_error) = call_tool(
            &server,
            "wait_for_agent",
            json!({ "agent_id": spawned["agent_id"], "timeout": 10_000 }),
        )
        .await;
        assert!(!is_error);
        assert_eq!(done["status"], "completed");
        assert_eq!(done["exit_code"], 0);
        assert_eq!(done["stdout"], "A");
        assert_eq!(done["stdout_truncated"], false);
        assert!(done["runtime_seconds"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_spawn_passes_exec_arguments() {
        let fake = FakeCodex::builder().build();
        let server = server_for(&fake);
        let workdir = fake.dir().to_path_buf();

        let id = spawn(
            &server,
            json!({
                "task": "refactor",
                "workdir": workdir,
                "model": "gpt-5-codex",
                "reasoning_effort": "extra_high",
                "additional_flags": ["--profile", "ci"],
                "skip_git_check": false
            }),
        )
        .await;
        call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;

        assert_eq!(
            fake.recorded_args(),
            vec![
                "exec".to_string(),
                "--dangerously-bypass-approvals-and-sandbox".to_string(),
                "-m".to_string(),
                "gpt-5-codex".to_string(),
                "-C".to_string(),
                workdir.display().to_string(),
                "--json".to_string(),
                "--color".to_string(),
                "never".to_string(),
                "-c".to_string(),
                "model_reasoning_effort=\"xhigh\"".to_string(),
                "--profile".to_string(),
                "ci".to_string(),
                "refactor".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_agent_output_reports_truncation() {
        let fake = FakeCodex::builder().stdout("0123456789A").build();
        let server = CodexMcpServer::new(Arc::new(Supervisor::new(
            SupervisorConfig::with_binary(fake.path()).max_output_size(10),
        )));

        let id = spawn(&server, json!({ "task": "t", "workdir": fake.dir() })).await;
        call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;

        let (output, is_error) = call_tool(&server, "get_agent_output", json!({ "agent_id": id })).await;
        assert!(!is_error);
        assert_eq!(output["stdout"], format!("0123456789{TRUNCATION_MARKER}"));
        assert_eq!(output["stdout_truncated"], true);
        assert_eq!(output["stderr_truncated"], false);
    }

    #[tokio::test]
    async fn test_stop_completed_agent_reports_exit_code() {
        let fake = FakeCodex::builder().exit_code(3).build();
        let server = server_for(&fake);

        let id = spawn(&server, json!({ "task": "t", "workdir": fake.dir() })).await;
        call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;

        let (payload, is_error) = call_tool(&server, "stop_agent", json!({ "agent_id": id })).await;
        assert!(is_error);
        assert_eq!(payload["error"], format!("Agent {id} already completed"));
        assert_eq!(payload["exit_code"], 3);
    }

    #[tokio::test]
    async fn test_wait_timeout_then_stop() {
        let fake = FakeCodex::builder().hang().build();
        let server = server_for(&fake);

        let id = spawn(&server, json!({ "task": "t", "workdir": fake.dir() })).await;

        let (payload, is_error) =
            call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 200 })).await;
        assert!(is_error);
        assert_eq!(payload["error"], format!("Timeout waiting for agent {id}"));
        assert_eq!(payload["timeout_ms"], 200);

        let (running, _) = call_tool(&server, "list_agents", json!({ "filter": "running" })).await;
        assert_eq!(running["running"], 1);

        let (ack, is_error) = call_tool(
            &server,
            "stop_agent",
            json!({ "agent_id": id, "signal": "SIGKILL" }),
        )
        .await;
        assert!(!is_error);
        assert_eq!(ack, json!({ "agent_id": id, "status": "terminated", "signal": "SIGKILL" }));

        let (done, _) =
            call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(done["exit_code"], 137);
        assert_eq!(done["exit_signal"], 9);
    }

    #[tokio::test]
    async fn test_parallel_spawn_and_list_counts() {
        let fake = FakeCodex::builder().stdout("ok").build();
        let server = server_for(&fake);

        let (payload, is_error) = call_tool(
            &server,
            "spawn_parallel_agents",
            json!({ "tasks": [
                { "task": "one", "workdir": fake.dir() },
                { "task": "two", "workdir": fake.dir(), "model": "gpt-5" },
                { "task": "three", "workdir": fake.dir(), "reasoning_effort": "low" }
            ]}),
        )
        .await;
        assert!(!is_error);
        assert_eq!(payload["spawned_count"], 3);
        assert_eq!(payload["status"], "parallel_execution_started");
        assert!(payload.get("errors").is_none());

        let ids: Vec<Value> = payload["agent_ids"].as_array().unwrap().clone();
        for id in &ids {
            call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;
        }

        let (all, _) = call_tool(&server, "list_agents", json!({})).await;
        assert_eq!(all["total"], 3);
        assert_eq!(all["completed"], 3);
        assert_eq!(all["running"], 0);

        let (running, _) = call_tool(&server, "list_agents", json!({ "filter": "running" })).await;
        assert_eq!(running["total"], 3);
        assert_eq!(running["agents"], json!([]));
    }

    #[tokio::test]
    async fn test_parallel_spawn_keeps_ids_when_a_task_fails() {
        let fake = FakeCodex::builder().stdout("ok").build();
        let server = server_for(&fake);
        let missing = fake.dir().join("does-not-exist");

        let (payload, is_error) = call_tool(
            &server,
            "spawn_parallel_agents",
            json!({ "tasks": [
                { "task": "one", "workdir": fake.dir() },
                { "task": "two", "workdir": missing },
                { "task": "three", "workdir": fake.dir() }
            ]}),
        )
        .await;
        assert!(!is_error, "parallel spawn failed: {payload}");
        assert_eq!(payload["spawned_count"], 2);
        assert_eq!(payload["failed_count"], 1);
        assert_eq!(payload["errors"][0]["task_index"], 1);
        assert_eq!(payload["errors"][0]["task"], "two");
        assert!(
            payload["errors"][0]["error"]
                .as_str()
                .unwrap()
                .contains("does-not-exist")
        );

        let ids = payload["agent_ids"].as_array().unwrap().clone();
        assert_eq!(ids.len(), 2);
        for id in &ids {
            let (done, is_error) =
                call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;
            assert!(!is_error);
            assert_eq!(done["stdout"], "ok");
        }

        let (all, _) = call_tool(&server, "list_agents", json!({})).await;
        assert_eq!(all["total"], 2);
    }

    #[tokio::test]
    async fn test_parallel_spawn_always_skips_git_check() {
        let fake = FakeCodex::builder().build();
        let server = server_for(&fake);

        let (payload, _) = call_tool(
            &server,
            "spawn_parallel_agents",
            json!({ "tasks": [{ "task": "only", "workdir": fake.dir() }] }),
        )
        .await;
        let id = payload["agent_ids"][0].clone();
        call_tool(&server, "wait_for_agent", json!({ "agent_id": id, "timeout": 10_000 })).await;

        assert!(fake.recorded_args().contains(&"--skip-git-repo-check".to_string()));
    }

    #[tokio::test]
    async fn test_check_codex_available() {
        let fake = FakeCodex::builder().build();
        let (payload, is_error) = call_tool(&server_for(&fake), "check_codex_available", json!({})).await;
        assert!(!is_error);
        assert_eq!(payload["available"], true);
        assert_eq!(payload["version"], codex_test_utils::fake::DEFAULT_VERSION);

        let broken = FakeCodex::builder().broken_version().build();
        let (payload, _) = call_tool(&server_for(&broken), "check_codex_available", json!({})).await;
        assert_eq!(payload["available"], false);
        assert!(payload["error"].as_str().unwrap().contains("broken install"));
    }
}
