//! `codex exec` argument construction

use std::path::PathBuf;

use codex_supervisor::SpawnRequest;

/// One non-interactive `codex exec` run
#[derive(Debug, Clone)]
pub struct ExecCommand {
    pub task: String,
    pub workdir: PathBuf,
    pub model: String,
    pub reasoning_effort: Option<String>,
    pub additional_flags: Vec<String>,
    pub skip_git_check: bool,
}

impl ExecCommand {
    /// Command with no reasoning override, no extra flags and the git check
    /// skipped
    pub fn new(
        task: impl Into<String>,
        workdir: impl Into<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            task: task.into(),
            workdir: workdir.into(),
            model: model.into(),
            reasoning_effort: None,
            additional_flags: Vec::new(),
            skip_git_check: true,
        }
    }

    pub fn reasoning_effort(mut self, effort: Option<String>) -> Self {
        self.reasoning_effort = effort;
        self
    }

    pub fn additional_flags(mut self, flags: Vec<String>) -> Self {
        self.additional_flags = flags;
        self
    }

    pub fn skip_git_check(mut self, skip: bool) -> Self {
        self.skip_git_check = skip;
        self
    }

    /// Argument list passed to the binary; the task is always last
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "exec".to_string(),
            "--dangerously-bypass-approvals-and-sandbox".to_string(),
            "-m".to_string(),
            self.model.clone(),
            "-C".to_string(),
            self.workdir.display().to_string(),
            "--json".to_string(),
            "--color".to_string(),
            "never".to_string(),
        ];

        if self.skip_git_check {
            args.push("--skip-git-repo-check".to_string());
        }
        if let Some(effort) = &self.reasoning_effort {
            args.push("-c".to_string());
            args.push(format!("model_reasoning_effort=\"{}\"", effort_value(effort)));
        }
        args.extend(self.additional_flags.iter().cloned());
        args.push(self.task.clone());
        args
    }

    pub fn into_request(self) -> SpawnRequest {
        let args = self.args();
        SpawnRequest::new(self.task, self.workdir, self.model).args(args)
    }
}

/// CLI spelling of a reasoning effort level
fn effort_value(effort: &str) -> &str {
    match effort {
        "extra_high" => "xhigh",
        other => other,
    }
}
