use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use rvcs_core::{FileArgs, VcsKind};
use rvcs_store::RepositoryRepo;

use crate::backend::{init_and_register, Backend, Tool, DEFAULT_COMMIT_MESSAGE};
use crate::error::{VcsError, VcsResult};
use crate::runner::CommandRunner;

const LOG_TEMPLATE: &str =
    "Changeset: {node|short}\nAuthor: {author|person} <{author|email}>\nDate: {date|shortdate}\nMessage: {desc}\n";

pub struct MercurialBackend {
    hg: Tool,
    registry: RepositoryRepo,
}

impl MercurialBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, registry: RepositoryRepo) -> Self {
        Self {
            hg: Tool::new(VcsKind::Mercurial, runner),
            registry,
        }
    }

    /// Any `hg status` line counts, untracked files included.
    async fn has_local_changes(&self, repo: &Path) -> Result<bool, VcsError> {
        let status = self.hg.run(repo, &["status"]).await?;
        Ok(!status.is_empty())
    }
}

#[async_trait]
impl Backend for MercurialBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Mercurial
    }

    async fn add(&self, repo: &Path, files: &FileArgs) -> VcsResult {
        let mut args = vec!["add"];
        args.extend(files.as_slice().iter().map(String::as_str));
        self.hg.run(repo, &args[..]).await?;
        Ok(format!("Mercurial: Added {} to the repository.", files.joined()))
    }

    async fn add_all(&self, repo: &Path) -> VcsResult {
        self.hg.run(repo, &["addremove"]).await?;
        Ok("Mercurial: Added all changes to the repository.".into())
    }

    async fn commit(&self, repo: &Path, comment: Option<&str>) -> VcsResult {
        let message = comment.unwrap_or(DEFAULT_COMMIT_MESSAGE);
        self.hg.run(repo, &["commit", "-m", message]).await?;
        Ok("Mercurial: Changes committed successfully.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn update(&self, repo: &Path) -> VcsResult {
        if self.has_local_changes(repo).await? {
            info!("update refused, working copy has local changes");
            return Ok("Mercurial: Local changes exist. Cannot update.".into());
        }
        self.hg.run(repo, &["pull", "-u"]).await?;
        Ok("Mercurial: Code updated successfully.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn push(&self, repo: &Path) -> VcsResult {
        if self.has_local_changes(repo).await? {
            info!("push refused, working copy has local changes");
            return Ok("Mercurial: Local changes exist. Cannot push.".into());
        }
        self.hg.run(repo, &["push"]).await?;
        Ok("Mercurial: Changes pushed successfully.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn init_repo(&self, name: &str, repo: &Path) -> VcsResult {
        init_and_register(VcsKind::Mercurial, &self.registry, name, repo, || {
            self.hg.run(repo, &["init"])
        })
        .await
    }

    async fn log(&self, repo: &Path) -> VcsResult {
        let out = self.hg.run(repo, &["log", "--template", LOG_TEMPLATE]).await?;
        Ok(self.hg.raw(out))
    }

    async fn status(&self, repo: &Path) -> VcsResult {
        let out = self.hg.run(repo, &["status"]).await?;
        Ok(self.hg.raw(out))
    }

    async fn pull(&self, repo: &Path) -> VcsResult {
        self.hg.run(repo, &["pull"]).await?;
        Ok("Mercurial: Pull operation completed successfully.".into())
    }

    /// `fetch` ships with Mercurial but is off by default.
    async fn fetch(&self, repo: &Path) -> VcsResult {
        self.hg.run(repo, &["--config", "extensions.fetch=", "fetch"]).await?;
        Ok("Mercurial: Fetch operation completed successfully.".into())
    }

    async fn list(&self, repo: &Path) -> VcsResult {
        let out = self.hg.run(repo, &["branches"]).await?;
        Ok(format!("Mercurial branches: {out}"))
    }

    async fn patch(&self, repo: &Path, patch_file: &str) -> VcsResult {
        self.hg.run(repo, &["import", patch_file]).await?;
        Ok(format!("Mercurial: Applied patch from '{patch_file}' successfully."))
    }

    async fn branch(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.hg.run(repo, &["branch", branch_name]).await?;
        Ok(format!("Mercurial: Created branch '{branch_name}' successfully."))
    }

    /// Switch to the branch, then merge into it.
    async fn merge(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.hg.run(repo, &["update", branch_name]).await?;
        self.hg.run(repo, &["merge"]).await?;
        Ok(format!("Mercurial: Merged branch '{branch_name}' successfully."))
    }

    async fn tag(&self, repo: &Path, tag_name: &str, _commit: Option<&str>) -> VcsResult {
        self.hg.run(repo, &["tag", tag_name]).await?;
        Ok(format!("Mercurial: Created tag '{tag_name}' successfully."))
    }
}
