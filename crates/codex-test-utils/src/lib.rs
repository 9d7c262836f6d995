//! Shared test utilities for the codex-mcp workspace.
//!
//! This crate provides fake agent binaries so supervisor and server tests can
//! exercise real subprocesses without the `codex` CLI installed. It is a
//! dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fake`]: [`FakeCodex`](fake::FakeCodex) builder writing scripted shell executables

#[cfg(unix)]
pub mod fake;

#[cfg(unix)]
pub use fake::FakeCodex;
