//! MCP Server implementation
//!
//! Reads newline-delimited JSON-RPC messages, handles each one on its own
//! task, and funnels every response through a single writer so that lines
//! never interleave on the output stream.

use std::sync::Arc;
use std::time::Duration;

use codex_supervisor::Supervisor;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::handlers::handle_tool_call;
use crate::protocol::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability, codes,
};
use crate::tools::{ToolDefinition, ToolResult, get_tool_definitions};
use crate::{Error, Result};

/// How long in-flight requests may keep running once input has closed
const IN_FLIGHT_GRACE: Duration = Duration::from_secs(1);

/// MCP Server for codex agents
///
/// Cheap to clone; clones share the supervisor and tool list.
///
/// # Example
///
/// ```ignore
/// use codex_mcp::CodexMcpServer;
/// use codex_supervisor::{Supervisor, SupervisorConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = CodexMcpServer::new(Supervisor::shared(SupervisorConfig::default()));
///     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
///     server.run(stdin, tokio::io::stdout()).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CodexMcpServer {
    supervisor: Arc<Supervisor>,
    tools: Arc<Vec<ToolDefinition>>,
}

impl CodexMcpServer {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        let tools = get_tool_definitions(&supervisor.config().default_model);
        Self {
            supervisor,
            tools: Arc::new(tools),
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Serve requests from `reader` until it reaches EOF
    ///
    /// Requests still running at EOF get [`IN_FLIGHT_GRACE`] to finish; the
    /// rest are cancelled. Agents are left alone; stopping them is the
    /// caller's job.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_responses(rx, writer));
        let mut in_flight = JoinSet::new();

        tracing::info!("MCP server ready, listening on stdio");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            tracing::debug!(request = %line, "Received message");

            let server = self.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                let Some(response) = server.handle_message(&line).await else {
                    return;
                };
                match serde_json::to_string(&response) {
                    Ok(json) => {
                        // The writer only goes away once input is done
                        let _ = tx.send(json);
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to serialize response"),
                }
            });

            // Reap finished requests so the set does not grow unbounded
            while in_flight.try_join_next().is_some() {}
        }

        tracing::info!(in_flight = in_flight.len(), "Input closed");
        let drained = tokio::time::timeout(IN_FLIGHT_GRACE, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(cancelled = in_flight.len(), "Cancelling unfinished requests");
            in_flight.shutdown().await;
        }

        drop(tx);
        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Io(std::io::Error::other(e))),
        }
    }

    /// Handle a single MCP message
    ///
    /// Returns `None` when no response is due: notifications, and requests
    /// sent without an id.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable message");
                return Some(JsonRpcResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        let notification = request.is_notification();
        let id = request.id.clone();
        let response = match self.dispatch(request).await {
            Ok(response) => response?,
            Err(e) => {
                tracing::error!(error = %e, "Request failed");
                JsonRpcResponse::error(id, codes::INTERNAL_ERROR, format!("Internal error: {e}"))
            }
        };

        if notification { None } else { Some(response) }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id)?,
            "initialized" | "notifications/initialized" => return Ok(None),
            "tools/list" => self.handle_tools_list(id)?,
            "tools/call" => self.handle_tools_call(id, request.params).await?,
            method => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ),
        };
        Ok(Some(response))
    }

    /// Handle the initialize request
    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "codex-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let tools = serde_json::to_value(self.tools.as_slice())?;
        Ok(JsonRpcResponse::success(
            id,
            serde_json::json!({ "tools": tools }),
        ))
    }

    /// Handle tools/call request
    ///
    /// Tool failures are reported inside a successful response with
    /// `isError` set; only malformed call params produce a JSON-RPC error.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        tracing::debug!(tool = %call.name, "Calling tool");
        let outcome = handle_tool_call(&self.supervisor, &call.name, call.arguments).await;
        let tool_result = match outcome {
            Ok(result) => ToolResult::text(serde_json::to_string_pretty(&result)?),
            Err(e) => {
                tracing::info!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::error(e.to_payload().to_string())
            }
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(tool_result)?))
    }
}

/// Write each response as one line, flushing after every line
async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<String>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_supervisor::SupervisorConfig;

    fn server() -> CodexMcpServer {
        CodexMcpServer::new(Supervisor::shared(SupervisorConfig::with_binary(
            "/nonexistent/codex",
        )))
    }

    async fn call(server: &CodexMcpServer, message: &str) -> Value {
        let response = server.handle_message(message).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn server_creation_loads_tools() {
        let server = server();
        assert_eq!(server.tools().len(), 7);
        assert_eq!(server.supervisor().agent_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_initialize() {
        let request = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#;
        let response = call(&server(), request).await;
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "codex-mcp");
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_handle_initialized_notifications() {
        let server = server();
        for request in [
            r#"{"jsonrpc":"2.0","method":"initialized"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ] {
            assert!(server.handle_message(request).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_request_without_id_gets_no_response() {
        let request = r#"{"jsonrpc":"2.0","method":"tools/list"}"#;
        assert!(server().handle_message(request).await.is_none());
    }

    #[tokio::test]
    async fn test_handle_tools_list() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[tokio::test]
    async fn test_handle_unknown_method() {
        let response =
            call(&server(), r#"{"jsonrpc":"2.0","id":4,"method":"unknown/method"}"#).await;
        assert_eq!(response["error"]["code"], codes::METHOD_NOT_FOUND);
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .contains("unknown/method")
        );
    }

    #[tokio::test]
    async fn test_handle_invalid_json() {
        let response = call(&server(), r#"{"invalid json"#).await;
        assert_eq!(response["error"]["code"], codes::PARSE_ERROR);
        assert!(response.get("id").is_none());
    }

    #[tokio::test]
    async fn test_handle_tools_call_bad_params() {
        let request = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"arguments":{}}}"#;
        let response = call(&server(), request).await;
        assert_eq!(response["error"]["code"], codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_handle_tools_call_unknown_tool() {
        let request = r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"unknown_tool","arguments":{}}}"#;
        let response = call(&server(), request).await;
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"], "Unknown tool: unknown_tool");
    }

    #[tokio::test]
    async fn test_run_answers_each_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let (client, server_side) = tokio::io::duplex(64 * 1024);

        server()
            .run(input.as_bytes(), server_side)
            .await
            .unwrap();

        let mut output = String::new();
        let mut client = client;
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();

        let mut ids: Vec<i64> = output
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].as_i64().unwrap())
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
