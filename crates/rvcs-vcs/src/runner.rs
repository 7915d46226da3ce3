use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::VcsError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Executes one external tool invocation.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv[0]` with the remaining elements as arguments inside `cwd`.
    ///
    /// Returns trimmed stdout on a zero exit status.
    async fn run(&self, argv: &[String], cwd: &Path) -> Result<String, VcsError>;
}

/// Runs tools as child processes. Never goes through a shell.
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Let invocations run for as long as the tool takes.
    pub fn without_timeout() -> Self {
        Self { timeout: None }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], cwd: &Path) -> Result<String, VcsError> {
        let (program, args) = argv.split_first().ok_or(VcsError::EmptyCommand)?;
        let command = argv.join(" ");

        debug!(program = %program, cwd = %cwd.display(), "running command");

        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child)
                .await
                .map_err(|_| VcsError::Timeout {
                    command: command.clone(),
                    timeout,
                })?,
            None => child.await,
        }
        .map_err(|e| VcsError::Spawn {
            program: program.clone(),
            detail: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        // Some tools (git commit, hg push) explain failures on stdout.
        let detail = if stderr.is_empty() { stdout } else { stderr };

        warn!(
            command = %command,
            exit_code = output.status.code().unwrap_or(-1),
            "command failed"
        );

        Err(VcsError::CommandFailed {
            command,
            stderr: detail,
        })
    }
}
