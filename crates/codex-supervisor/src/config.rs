//! Supervisor configuration
//!
//! Built once at startup by whatever loads the process configuration and
//! handed to [`Supervisor::new`](crate::Supervisor::new).

use std::path::PathBuf;
use std::time::Duration;

use crate::output::DEFAULT_MAX_OUTPUT_SIZE;

/// Default agent binary, resolved through `PATH`
pub const DEFAULT_BINARY: &str = "codex";
/// Default model identifier passed to new agents
pub const DEFAULT_MODEL: &str = "o3";
/// Default grace period for draining output pipes after exit
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
/// Default upper bound on the availability check
pub const DEFAULT_VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings the supervisor consumes but does not own
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Agent binary to launch
    pub binary: PathBuf,
    /// Model used when a spawn request does not name one
    pub default_model: String,
    /// Per-stream output ceiling in bytes
    pub max_output_size: usize,
    /// How long the exit observer waits for stdout/stderr to reach EOF
    /// after the process exits before marking the agent completed
    pub drain_timeout: Duration,
    /// Upper bound on `<binary> --version`
    pub version_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            default_model: DEFAULT_MODEL.to_string(),
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            version_timeout: DEFAULT_VERSION_TIMEOUT,
        }
    }
}

impl SupervisorConfig {
    /// Config for a specific binary with all other settings defaulted
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// Set the per-stream output ceiling
    pub fn max_output_size(mut self, bytes: usize) -> Self {
        self.max_output_size = bytes;
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the post-exit drain grace period
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }
}
