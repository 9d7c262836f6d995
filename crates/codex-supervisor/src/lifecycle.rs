//! Exit observation: the RUNNING → COMPLETED transition

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;

use crate::record::AgentRecord;
use crate::types::ExitOutcome;

/// Code recorded when the exit status cannot be read at all
const UNKNOWN_EXIT_CODE: i32 = -1;

/// Wait for `child` to exit and mark `record` completed
///
/// After the exit, output readers get up to `drain_timeout` to hit EOF so
/// that a completed record already holds all of its output. The record is
/// marked reaped first, so signals are refused during the drain. A grandchild that
/// inherited the pipes can keep them open past that; its later output still
/// lands in the buffers after the transition.
pub(crate) async fn observe_exit(
    record: Arc<AgentRecord>,
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    drain_timeout: Duration,
) {
    let outcome = match child.wait().await {
        Ok(status) => outcome_from_status(status),
        Err(e) => {
            tracing::warn!(agent_id = %record.id(), error = %e, "Failed waiting for agent");
            ExitOutcome {
                code: UNKNOWN_EXIT_CODE,
                signal: None,
            }
        }
    };
    // The pid is free for reuse from here on
    record.mark_reaped(outcome);

    let drained = tokio::time::timeout(drain_timeout, async {
        for reader in readers {
            let _ = reader.await;
        }
    })
    .await;
    if drained.is_err() {
        tracing::debug!(
            agent_id = %record.id(),
            "Output pipes still open after exit; completing without full drain"
        );
    }

    if record.complete(outcome) {
        tracing::info!(
            agent_id = %record.id(),
            exit_code = outcome.code,
            signal = ?outcome.signal,
            "Agent exited"
        );
    }
}

/// Map an OS exit status onto an [`ExitOutcome`]
pub(crate) fn outcome_from_status(status: ExitStatus) -> ExitOutcome {
    if let Some(code) = status.code() {
        return ExitOutcome { code, signal: None };
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitOutcome::from_signal(signal);
        }
    }

    ExitOutcome {
        code: UNKNOWN_EXIT_CODE,
        signal: None,
    }
}
