use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use rvcs_core::{FileArgs, VcsKind};
use rvcs_store::RepositoryRepo;

use crate::backend::{init_and_register, Backend, Tool, DEFAULT_COMMIT_MESSAGE};
use crate::error::{VcsError, VcsResult};
use crate::runner::CommandRunner;

/// Subversion backend. Commits go straight to the server, so there is nothing
/// to push, and branches and tags are plain copies.
pub struct SvnBackend {
    svn: Tool,
    registry: RepositoryRepo,
}

impl SvnBackend {
    pub fn new(runner: Arc<dyn CommandRunner>, registry: RepositoryRepo) -> Self {
        Self {
            svn: Tool::new(VcsKind::Svn, runner),
            registry,
        }
    }

    async fn copy(&self, repo: &Path, target: &str) -> Result<String, VcsError> {
        let source = repo.to_string_lossy();
        self.svn.run(repo, &["copy", source.as_ref(), target]).await
    }
}

#[async_trait]
impl Backend for SvnBackend {
    fn kind(&self) -> VcsKind {
        VcsKind::Svn
    }

    async fn add(&self, repo: &Path, files: &FileArgs) -> VcsResult {
        let mut args = vec!["add"];
        args.extend(files.as_slice().iter().map(String::as_str));
        self.svn.run(repo, &args[..]).await?;
        Ok(format!("SVN: Added {} to the repository.", files.joined()))
    }

    async fn add_all(&self, repo: &Path) -> VcsResult {
        self.svn.run(repo, &["add", "--force", "."]).await?;
        Ok("SVN: Added all changes to the repository.".into())
    }

    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn commit(&self, repo: &Path, comment: Option<&str>) -> VcsResult {
        let message = comment.unwrap_or(DEFAULT_COMMIT_MESSAGE);
        self.svn.run(repo, &["commit", "-m", message]).await?;
        Ok("SVN: Changes committed successfully.".into())
    }

    async fn update(&self, repo: &Path) -> VcsResult {
        self.svn.run(repo, &["update", "."]).await?;
        Ok("SVN: Code updated successfully.".into())
    }

    async fn push(&self, _repo: &Path) -> VcsResult {
        Ok("SVN: Pushing changes is not supported in SVN.\n\
            You should use 'svn commit' to commit your changes to the repository."
            .into())
    }

    /// `name` is the URL checked out into `repo`.
    #[instrument(skip(self, repo), fields(repo = %repo.display()))]
    async fn init_repo(&self, name: &str, repo: &Path) -> VcsResult {
        init_and_register(VcsKind::Svn, &self.registry, name, repo, || async move {
            self.svn.run(repo, &["checkout", name, "."]).await
        })
        .await
    }

    async fn log(&self, repo: &Path) -> VcsResult {
        let out = self.svn.run(repo, &["log", "--verbose"]).await?;
        Ok(self.svn.raw(out))
    }

    async fn status(&self, repo: &Path) -> VcsResult {
        let out = self.svn.run(repo, &["status"]).await?;
        Ok(self.svn.raw(out))
    }

    async fn pull(&self, repo: &Path) -> VcsResult {
        self.svn.run(repo, &["update"]).await?;
        Ok("SVN: Pull operation completed successfully.".into())
    }

    async fn fetch(&self, repo: &Path) -> VcsResult {
        self.svn.run(repo, &["update"]).await?;
        Ok("SVN: Fetch operation completed successfully.".into())
    }

    async fn list(&self, repo: &Path) -> VcsResult {
        let out = self.svn.run(repo, &["list"]).await?;
        Ok(format!("SVN repository contents:\n{out}"))
    }

    async fn patch(&self, repo: &Path, patch_file: &str) -> VcsResult {
        self.svn.run(repo, &["patch", patch_file]).await?;
        Ok(format!("SVN: Applied patch from '{patch_file}' successfully."))
    }

    async fn branch(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.copy(repo, branch_name).await?;
        Ok(format!("SVN: Created branch '{branch_name}' successfully."))
    }

    async fn merge(&self, repo: &Path, branch_name: &str) -> VcsResult {
        self.svn.run(repo, &["merge", branch_name]).await?;
        Ok(format!("SVN: Merged changes from branch '{branch_name}' successfully."))
    }

    async fn tag(&self, repo: &Path, tag_name: &str, _commit: Option<&str>) -> VcsResult {
        self.copy(repo, tag_name).await?;
        Ok(format!("SVN: Created tag '{tag_name}' successfully."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedRunner;
    use rvcs_store::Database;

    fn setup(runner: ScriptedRunner) -> (SvnBackend, Arc<ScriptedRunner>, RepositoryRepo) {
        let runner = Arc::new(runner);
        let registry = RepositoryRepo::new(Database::in_memory().unwrap());
        (SvnBackend::new(runner.clone(), registry.clone()), runner, registry)
    }

    #[tokio::test]
    async fn push_never_invokes_svn() {
        let (svn, runner, _) = setup(ScriptedRunner::new());
        let reply = svn.push(Path::new("/wc")).await.unwrap();
        assert_eq!(
            reply,
            "SVN: Pushing changes is not supported in SVN.\n\
             You should use 'svn commit' to commit your changes to the repository."
        );
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn commit_defaults_the_message() {
        let (svn, runner, _) = setup(ScriptedRunner::new());
        svn.commit(Path::new("/wc"), None).await.unwrap();
        svn.commit(Path::new("/wc"), Some("fix typo")).await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["svn commit -m Default commit message", "svn commit -m fix typo"]
        );
    }

    #[tokio::test]
    async fn branch_and_tag_copy_the_working_copy() {
        let (svn, runner, _) = setup(ScriptedRunner::new());
        let wc = Path::new("/wc");
        assert_eq!(svn.branch(wc, "^/branches/b1").await.unwrap(), "SVN: Created branch '^/branches/b1' successfully.");
        assert_eq!(svn.tag(wc, "^/tags/v1", Some("r42")).await.unwrap(), "SVN: Created tag '^/tags/v1' successfully.");
        assert_eq!(
            runner.command_lines(),
            vec!["svn copy /wc ^/branches/b1", "svn copy /wc ^/tags/v1"]
        );
    }

    #[tokio::test]
    async fn update_pull_and_fetch() {
        let (svn, runner, _) = setup(ScriptedRunner::new());
        let wc = Path::new("/wc");
        assert_eq!(svn.update(wc).await.unwrap(), "SVN: Code updated successfully.");
        assert_eq!(svn.pull(wc).await.unwrap(), "SVN: Pull operation completed successfully.");
        assert_eq!(svn.fetch(wc).await.unwrap(), "SVN: Fetch operation completed successfully.");
        assert_eq!(runner.command_lines(), vec!["svn update .", "svn update", "svn update"]);
    }

    #[tokio::test]
    async fn add_all_forces_recursive_add() {
        let (svn, runner, _) = setup(ScriptedRunner::new());
        assert_eq!(svn.add_all(Path::new("/wc")).await.unwrap(), "SVN: Added all changes to the repository.");
        assert_eq!(runner.command_lines(), vec!["svn add --force ."]);
    }

    #[tokio::test]
    async fn list_and_empty_log() {
        let (svn, _, _) = setup(ScriptedRunner::new().respond(&["svn", "list"], "trunk/\nbranches/"));
        let wc = Path::new("/wc");
        assert_eq!(svn.list(wc).await.unwrap(), "SVN repository contents:\ntrunk/\nbranches/");
        assert_eq!(svn.log(wc).await.unwrap(), "SVN: No output.");
    }

    #[tokio::test]
    async fn merge_and_patch_replies() {
        let (svn, _, _) = setup(ScriptedRunner::new());
        let wc = Path::new("/wc");
        assert_eq!(
            svn.merge(wc, "^/branches/b1").await.unwrap(),
            "SVN: Merged changes from branch '^/branches/b1' successfully."
        );
        assert_eq!(
            svn.patch(wc, "fix.diff").await.unwrap(),
            "SVN: Applied patch from 'fix.diff' successfully."
        );
    }

    #[tokio::test]
    async fn init_checks_out_the_named_url() {
        let dir = tempfile::tempdir().unwrap();
        let wc = dir.path().join("wc");
        let (svn, runner, registry) = setup(ScriptedRunner::new());
        let reply = svn.init_repo("file:///srv/svn/project", &wc).await.unwrap();
        assert_eq!(reply, "SVN: Repository initialized successfully.");
        assert_eq!(
            runner.calls()[0].argv,
            vec!["svn", "checkout", "file:///srv/svn/project", "."]
        );
        assert_eq!(runner.calls()[0].cwd, wc);
        let rows = registry.list_active().unwrap();
        assert_eq!(rows[0].kind, "SVN");
        assert_eq!(rows[0].name, "file:///srv/svn/project");
    }

    #[tokio::test]
    async fn failed_checkout_reports_the_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let (svn, _, registry) = setup(
            ScriptedRunner::new().fail(&["svn", "checkout"], "svn: E170000: URL doesn't exist"),
        );
        let err = svn.init_repo("file:///nope", dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("E170000"));
        assert_eq!(registry.count().unwrap(), 0);
    }
}
