use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::VcsError;
use crate::runner::CommandRunner;

/// One recorded invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
}

enum Outcome {
    Stdout(String),
    Stderr(String),
}

struct Rule {
    prefix: Vec<String>,
    outcome: Outcome,
}

/// Runner that never spawns anything: records every argv and answers from
/// pre-programmed rules, so backends can be tested without the tools installed.
///
/// Rules match on an argv prefix; the first matching rule wins. Unmatched
/// invocations succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for invocations starting with `prefix`.
    pub fn respond(self, prefix: &[&str], stdout: &str) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            outcome: Outcome::Stdout(stdout.to_string()),
        });
        self
    }

    /// Fail with `stderr` for invocations starting with `prefix`.
    pub fn fail(self, prefix: &[&str], stderr: &str) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            outcome: Outcome::Stderr(stderr.to_string()),
        });
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Recorded argv lists, joined with spaces.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.argv.join(" ")).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, argv: &[String], cwd: &Path) -> Result<String, VcsError> {
        if argv.is_empty() {
            return Err(VcsError::EmptyCommand);
        }

        self.calls.lock().push(Invocation {
            argv: argv.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        let rules = self.rules.lock();
        match rules.iter().find(|r| argv.starts_with(&r.prefix)) {
            Some(Rule {
                outcome: Outcome::Stdout(out),
                ..
            }) => Ok(out.clone()),
            Some(Rule {
                outcome: Outcome::Stderr(err),
                ..
            }) => Err(VcsError::CommandFailed {
                command: argv.join(" "),
                stderr: err.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn first_matching_prefix_wins() {
        let runner = ScriptedRunner::new()
            .fail(&["git", "apply", "--check"], "patch does not apply")
            .respond(&["git", "apply"], "applied");

        let check = runner.run(&argv(&["git", "apply", "--check", "x.patch"]), Path::new("/r")).await;
        assert!(check.is_err());

        let apply = runner.run(&argv(&["git", "apply", "x.patch"]), Path::new("/r")).await;
        assert_eq!(apply.unwrap(), "applied");
    }

    #[tokio::test]
    async fn unmatched_commands_succeed_silently_and_are_recorded() {
        let runner = ScriptedRunner::new();
        let out = runner.run(&argv(&["hg", "push"]), Path::new("/repo")).await.unwrap();
        assert_eq!(out, "");
        assert_eq!(
            runner.calls(),
            vec![Invocation {
                argv: argv(&["hg", "push"]),
                cwd: PathBuf::from("/repo"),
            }]
        );
    }
}
