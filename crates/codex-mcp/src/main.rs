//! codex MCP Server
//!
//! A Model Context Protocol server that runs `codex exec` agents in the
//! background and lets the client poll, wait for and stop them.
//!
//! # Usage
//!
//! ```bash
//! codex-mcp [--codex-bin <path>] [--default-model <model>] [--max-output-size <bytes>]
//! ```
//!
//! # Environment Variables
//!
//! - `CODEX_BIN`, `CODEX_DEFAULT_MODEL`, `MAX_OUTPUT_SIZE`, `CODEX_DRAIN_TIMEOUT_MS`:
//!   same as the flags
//! - `RUST_LOG`: Control log verbosity (default: `codex_mcp=info,codex_supervisor=info`)
//!
//! # Protocol
//!
//! The server communicates via JSON-RPC 2.0 over stdio:
//! - Requests/responses go through stdout
//! - Logs go to stderr (to avoid interfering with the protocol)
//!
//! When stdin closes, or on SIGINT/SIGTERM, every running agent is sent
//! SIGTERM and the server exits with status 0.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use codex_mcp::CodexMcpServer;
use codex_supervisor::config::{DEFAULT_BINARY, DEFAULT_MODEL};
use codex_supervisor::{DEFAULT_MAX_OUTPUT_SIZE, Supervisor, SupervisorConfig};

/// MCP server for codex agents
#[derive(Parser, Debug)]
#[command(name = "codex-mcp")]
#[command(about = "MCP server that spawns and supervises codex CLI agents")]
#[command(version)]
struct Args {
    /// Agent binary to launch
    #[arg(long, env = "CODEX_BIN", default_value = DEFAULT_BINARY)]
    codex_bin: PathBuf,

    /// Model used when a spawn request does not name one
    #[arg(long, env = "CODEX_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    default_model: String,

    /// Per-stream output ceiling in bytes
    #[arg(long, env = "MAX_OUTPUT_SIZE", default_value_t = DEFAULT_MAX_OUTPUT_SIZE)]
    max_output_size: usize,

    /// Grace period for draining agent output after exit, in milliseconds
    #[arg(long, env = "CODEX_DRAIN_TIMEOUT_MS", default_value_t = 2000)]
    drain_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> SupervisorConfig {
        SupervisorConfig::with_binary(self.codex_bin)
            .default_model(self.default_model)
            .max_output_size(self.max_output_size)
            .drain_timeout(Duration::from_millis(self.drain_timeout_ms))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging to stderr (stdout is reserved for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("codex_mcp=info".parse()?)
                .add_directive("codex_supervisor=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    tracing::info!(
        binary = %config.binary.display(),
        default_model = %config.default_model,
        max_output_bytes = config.max_output_size,
        max_output_mib = config.max_output_size as f64 / (1024.0 * 1024.0),
        "Starting codex-mcp server"
    );

    let supervisor = Supervisor::shared(config);
    let server = CodexMcpServer::new(supervisor.clone());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = server.run(stdin, tokio::io::stdout()) => match result {
            Ok(()) => tracing::info!("stdin closed, shutting down"),
            Err(e) => tracing::error!(error = %e, "Server loop failed, shutting down"),
        },
        () = shutdown_signal() => tracing::info!("Received shutdown signal"),
    }

    let signalled = supervisor.shutdown();
    tracing::info!(signalled, "Shutdown complete");

    // The blocking stdin reader would otherwise keep the runtime alive
    std::process::exit(0);
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
