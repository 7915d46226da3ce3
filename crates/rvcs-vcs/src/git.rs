use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use rvcs_core::{FileArgs, VcsKind};
use rvcs_store::RepositoryRepo;

use crate::backend::{init_and_register, Backend, Tool};
use crate::error::VcsResult;
use crate::runner::CommandRunner;

const LOG_FORMAT: &str = "--pretty=format:Commit: %H%nAuthor: %an <%ae>%nDate: %ad%nMessage: %s%n";

/// Git backend. Staging is explicit, so `add` names what went into the index.
pub struct GitBackend {
    git: Tool,
    registry: RepositoryRepo,
}

impl GitBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, registry: RepositoryRepo) -> Self {
        Self {
            git: Tool::new(VcsKind::Git, runner),
            registry,
        }
    }
}

#[async_trait]
impl Backend for GitBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    async fn add(&self, repo: &Path, files: &FileArgs) -> VcsResult {
        let mut args = vec!["add"];
        args.extend(files.as_slice().iter().map(String::as_str));
        self.git.run(repo, &args[..]).await?;
        Ok(format!("Git: Added {} to the index.", files.joined()))
    }

    /// Without a comment git is handed an empty message and refuses.
    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn commit(&self, repo: &Path, comment: Option<&str>) -> VcsResult {
        self.git.run(repo, &["commit", "-m", comment.unwrap_or("")]).await?;
        Ok("Git: Changes committed successfully.".into())
    }

    async fn update(&self, repo: &Path) -> VcsResult {
        self.git.run(repo, &["pull"]).await?;
        Ok("Git: Code updated successfully.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn push(&self, repo: &Path) -> VcsResult {
        self.git.run(repo, &["push"]).await?;
        Ok("Git: Changes pushed successfully.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn init_repo(&self, name: &str, repo: &Path) -> VcsResult {
        init_and_register(VcsKind::Git, &self.registry, name, repo, || {
            self.git.run(repo, &["init"])
        })
        .await
    }

    async fn log(&self, repo: &Path) -> VcsResult {
        let out = self.git.run(repo, &["log", LOG_FORMAT]).await?;
        Ok(self.git.raw(out))
    }

    async fn status(&self, repo: &Path) -> VcsResult {
        let out = self.git.run(repo, &["status"]).await?;
        Ok(self.git.raw(out))
    }

    async fn pull(&self, repo: &Path) -> VcsResult {
        self.git.run(repo, &["pull"]).await?;
        Ok("Git: Changes pulled successfully.".into())
    }

    async fn fetch(&self, repo: &Path) -> VcsResult {
        self.git.run(repo, &["fetch"]).await?;
        Ok("Git: Remote changes fetched successfully.".into())
    }

    async fn list(&self, repo: &Path) -> VcsResult {
        let out = self.git.run(repo, &["branch"]).await?;
        Ok(format!("Git Branches: {out}"))
    }

    /// Dry-run first; a patch that does not apply cleanly is never applied.
    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn patch(&self, repo: &Path, patch_file: &str) -> VcsResult {
        self.git.run(repo, &["apply", "--check", patch_file]).await?;
        self.git.run(repo, &["apply", patch_file]).await?;
        Ok(format!("Git: Patch applied successfully from {patch_file}."))
    }

    async fn branch(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.git.run(repo, &["branch", branch_name]).await?;
        Ok(format!("Git: Branch '{branch_name}' created successfully."))
    }

    async fn merge(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.git.run(repo, &["merge", branch_name]).await?;
        Ok(format!("Git: Merged branch '{branch_name}' successfully."))
    }

    async fn tag(&self, repo: &Path, tag_name: &str, commit: Option<&str>) -> VcsResult {
        let mut args = vec!["tag", tag_name];
        args.extend(commit);
        self.git.run(repo, &args[..]).await?;
        Ok(format!("Git: Tag '{tag_name}' created successfully."))
    }
}
