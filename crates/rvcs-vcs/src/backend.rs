use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use rvcs_core::{FileArgs, VcsKind};
use rvcs_store::RepositoryRepo;

use crate::error::{VcsError, VcsResult};
use crate::runner::CommandRunner;

/// Fallback commit message for tools that accept one.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Default commit message";

/// The uniform command surface, implemented once per tool.
///
/// Every operation takes the repository's working directory and yields the
/// reply text on success. Failures are returned, never panicked; the caller
/// turns them into a reply with [`crate::reply`].
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> VcsKind;

    async fn add(&self, repo: &Path, files: &FileArgs) -> VcsResult;

    async fn add_all(&self, _repo: &Path) -> VcsResult {
        Err(VcsError::Unsupported(format!(
            "add_all is not supported by {}",
            self.kind().label()
        )))
    }

    async fn commit(&self, repo: &Path, comment: Option<&str>) -> VcsResult;

    async fn update(&self, repo: &Path) -> VcsResult;

    async fn push(&self, repo: &Path) -> VcsResult;

    /// Initialize (or check out) a repository at `repo` and record it.
    /// A repository that already exists is left alone and not recorded again.
    async fn init_repo(&self, name: &str, repo: &Path) -> VcsResult;

    async fn log(&self, repo: &Path) -> VcsResult;

    async fn status(&self, repo: &Path) -> VcsResult;

    async fn pull(&self, repo: &Path) -> VcsResult;

    async fn fetch(&self, repo: &Path) -> VcsResult;

    async fn list(&self, repo: &Path) -> VcsResult;

    async fn patch(&self, repo: &Path, patch_file: &str) -> VcsResult;

    async fn branch(&self, repo: &Path, branch_name: &str) -> VcsResult;

    async fn merge(&self, repo: &Path, branch_name: &str) -> VcsResult;

    async fn tag(&self, repo: &Path, tag_name: &str, commit: Option<&str>) -> VcsResult;
}

/// Runs one tool's subcommands through the shared runner.
#[derive(Clone)]
pub(crate) struct Tool {
    kind: VcsKind,
    runner: Arc<dyn CommandRunner>,
}

impl Tool {
    pub(crate) fn new(kind: VcsKind, runner: Arc<dyn CommandRunner>) -> Self {
        Self { kind, runner }
    }

    /// `<program> <args...>` inside `repo`.
    pub(crate) async fn run<S: AsRef<str>>(&self, repo: &Path, args: &[S]) -> Result<String, VcsError> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.kind.program().to_string());
        argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        self.runner.run(&argv, repo).await
    }

    /// Reply for commands whose output is the payload. Empty output still
    /// produces a non-empty reply.
    pub(crate) fn raw(&self, output: String) -> String {
        if output.is_empty() {
            format!("{}: No output.", self.kind.label())
        } else {
            output
        }
    }
}

/// Shared init flow: check the marker, run the tool's init, record the result.
pub(crate) async fn init_and_register<F, Fut>(
    kind: VcsKind,
    registry: &RepositoryRepo,
    name: &str,
    repo: &Path,
    init: F,
) -> VcsResult
where
    F: FnOnce() -> Fut + Send,
    Fut: std::future::Future<Output = Result<String, VcsError>> + Send,
{
    if kind.is_initialized(repo) {
        return Ok(format!("{}: Repository already exists.", kind.label()));
    }

    std::fs::create_dir_all(repo)?;
    init().await?;

    if let Err(e) = registry.insert(name, kind, repo) {
        error!(kind = %kind, path = %repo.display(), error = %e, "repository initialized but not recorded");
        return Err(VcsError::NotRecorded {
            path: repo.display().to_string(),
            source: e,
        });
    }

    info!(kind = %kind, name, path = %repo.display(), "repository registered");
    Ok(format!("{}: Repository initialized successfully.", kind.label()))
}
