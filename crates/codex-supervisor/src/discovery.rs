//! Availability check for the agent binary
//!
//! Runs `<binary> --version` and reports whether it executed successfully.
//! Nothing is registered; the check is independent of the agent registry.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Result, SupervisorError};
use crate::types::Availability;

/// Run the version query and return its trimmed stdout
pub(crate) async fn query_version(binary: &Path, timeout: Duration) -> Result<String> {
    let mut cmd = Command::new(binary);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            SupervisorError::AvailabilityCheck(format!(
                "{} --version did not finish within {}ms",
                binary.display(),
                timeout.as_millis()
            ))
        })?
        .map_err(|e| SupervisorError::AvailabilityCheck(e.to_string()))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = if stderr.is_empty() {
            format!("Failed to execute {}", binary.display())
        } else {
            stderr.into_owned()
        };
        Err(SupervisorError::AvailabilityCheck(reason))
    }
}

/// Probe `binary` and fold the outcome into an [`Availability`] report
pub(crate) async fn probe_availability(binary: &Path, timeout: Duration) -> Availability {
    let name = binary.display().to_string();
    match query_version(binary, timeout).await {
        Ok(version) => {
            tracing::debug!(binary = %name, version = %version, "Agent binary available");
            Availability {
                available: true,
                binary: name,
                version: Some(version),
                error: None,
            }
        }
        Err(e) => {
            tracing::debug!(binary = %name, error = %e, "Agent binary unavailable");
            Availability {
                available: false,
                binary: name,
                version: None,
                error: Some(e.to_string()),
            }
        }
    }
}
