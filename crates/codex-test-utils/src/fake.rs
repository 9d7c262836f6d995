//! [`FakeCodex`] builder for scripted agent subprocesses.
//!
//! Each fake is a `/bin/sh` script in its own temporary directory. It answers
//! `--version` like the real CLI, records the arguments of every other
//! invocation to `args.txt`, writes the configured stdout/stderr, and then
//! either exits with the configured code or hangs until signalled.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Version string reported by default
pub const DEFAULT_VERSION: &str = "codex-cli 0.0.0-test";

/// A scripted stand-in for the `codex` binary.
///
/// # Example
///
/// ```rust,no_run
/// use codex_test_utils::FakeCodex;
///
/// let fake = FakeCodex::builder().stdout("A").exit_code(0).build();
/// assert!(fake.path().exists());
/// ```
pub struct FakeCodex {
    temp_dir: TempDir,
    path: PathBuf,
}

/// Builder for [`FakeCodex`]
#[derive(Debug, Clone)]
pub struct FakeCodexBuilder {
    stdout: String,
    stderr: String,
    exit_code: i32,
    sleep_secs: Option<f64>,
    hang: bool,
    version: Option<String>,
    body: Option<String>,
}

impl Default for FakeCodexBuilder {
    fn default() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            sleep_secs: None,
            hang: false,
            version: Some(DEFAULT_VERSION.to_string()),
            body: None,
        }
    }
}

impl FakeCodexBuilder {
    /// Text written to stdout before exiting
    pub fn stdout(mut self, text: impl Into<String>) -> Self {
        self.stdout = text.into();
        self
    }

    /// Text written to stderr before exiting
    pub fn stderr(mut self, text: impl Into<String>) -> Self {
        self.stderr = text.into();
        self
    }

    /// Exit code of a normal run
    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Sleep after writing output, before exiting
    pub fn sleep_secs(mut self, secs: f64) -> Self {
        self.sleep_secs = Some(secs);
        self
    }

    /// Never exit on its own; the script `exec`s into a long sleep so that a
    /// signal sent to its pid reaches the sleeping process directly.
    pub fn hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// `--version` fails with a message on stderr instead of printing a version
    pub fn broken_version(mut self) -> Self {
        self.version = None;
        self
    }

    /// Replace the generated run section with a raw shell snippet
    pub fn script(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Write the script to a fresh temporary directory.
    ///
    /// # Panics
    /// Panics if the script cannot be written or made executable.
    pub fn build(self) -> FakeCodex {
        let temp_dir = TempDir::new().unwrap_or_else(|e| panic!("FakeCodex: tempdir: {e}"));
        let path = temp_dir.path().join("codex");
        let args_file = temp_dir.path().join("args.txt");

        let mut script = String::from("#!/bin/sh\n");

        script.push_str("if [ \"$1\" = \"--version\" ]; then\n");
        match &self.version {
            Some(version) => {
                script.push_str(&format!("  printf '%s\\n' {}\n  exit 0\n", quote(version)));
            }
            None => {
                script.push_str("  printf 'codex: broken install' >&2\n  exit 1\n");
            }
        }
        script.push_str("fi\n");

        script.push_str(&format!(
            "printf '%s\\n' \"$@\" > {}\n",
            quote(&args_file.display().to_string())
        ));

        match &self.body {
            Some(body) => {
                script.push_str(body);
                script.push('\n');
            }
            None => {
                if !self.stdout.is_empty() {
                    script.push_str(&format!("printf '%s' {}\n", quote(&self.stdout)));
                }
                if !self.stderr.is_empty() {
                    script.push_str(&format!("printf '%s' {} >&2\n", quote(&self.stderr)));
                }
                if self.hang {
                    script.push_str("exec sleep 3600\n");
                } else {
                    if let Some(secs) = self.sleep_secs {
                        script.push_str(&format!("sleep {secs}\n"));
                    }
                    script.push_str(&format!("exit {}\n", self.exit_code));
                }
            }
        }

        fs::write(&path, script)
            .unwrap_or_else(|e| panic!("FakeCodex: failed to write {}: {e}", path.display()));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .unwrap_or_else(|e| panic!("FakeCodex: failed to chmod {}: {e}", path.display()));

        FakeCodex { temp_dir, path }
    }
}

impl FakeCodex {
    pub fn builder() -> FakeCodexBuilder {
        FakeCodexBuilder::default()
    }

    /// Path of the executable script
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the script; usable as an agent working directory
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Arguments of the most recent non-`--version` invocation, one per entry.
    ///
    /// Returns an empty list if the fake has not run yet.
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.dir().join("args.txt"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Single-quote `s` for `/bin/sh`
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
