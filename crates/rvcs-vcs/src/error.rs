use std::time::Duration;

use rvcs_store::StoreError;

pub type VcsResult = Result<String, VcsError>;

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// The tool ran and exited non-zero.
    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The tool could not be started (not installed, bad working directory).
    #[error("failed to start '{program}': {detail}")]
    Spawn { program: String, detail: String },

    #[error("empty command")]
    EmptyCommand,

    #[error("'{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("{0}")]
    Unsupported(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// Persistence problem, as opposed to a VCS problem.
    #[error("registry error: {0}")]
    Registry(#[from] StoreError),

    /// The tool succeeded but the registry insert did not.
    #[error("repository initialized at {path} but could not be recorded: {source}")]
    NotRecorded { path: String, source: StoreError },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VcsError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::CommandFailed { .. } => "command_failed",
            Self::Spawn { .. } => "spawn",
            Self::EmptyCommand => "empty_command",
            Self::Timeout { .. } => "timeout",
            Self::Unsupported(_) => "unsupported",
            Self::MissingArgument(_) => "missing_argument",
            Self::Registry(_) | Self::NotRecorded { .. } => "registry",
            Self::Io(_) => "io",
        }
    }
}
