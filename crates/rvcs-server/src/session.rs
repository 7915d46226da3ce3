use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use rvcs_core::{SessionId, VcsKind, Verb};
use rvcs_store::RepositoryRepo;
use rvcs_vcs::{create_backend, reconcile, CommandRunner, Reply};

use crate::router::{unrecognized, Router, BACK_REPLY};

pub const NO_VCS_SELECTED: &str = "No VCS selected. Use 'use <git|hg|svn> [path]' first.";
pub const GOODBYE: &str = "Goodbye.";

const MENU_HELP: &str = concat!(
    "Available commands:\n",
    "  - use <git|hg|svn> [path]: Work with a repository of that kind (default path: the server's repository root).\n",
    "  - repos: List managed repositories, pruning ones that no longer exist.\n",
    "  - help: Display this help message.\n",
    "  - quit: Close the connection.\n",
);

/// What every session on a server shares.
#[derive(Clone)]
pub struct SessionContext {
    pub registry: RepositoryRepo,
    pub runner: Arc<dyn CommandRunner>,
    /// Default repository path; relative `use` paths resolve against it.
    pub repo_root: PathBuf,
}

/// The result of one request.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub reply: Reply,
    /// The client asked to leave; close after sending the reply.
    pub close: bool,
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self { reply, close: false }
    }
}

/// Per-connection state: the main menu, or bound to one repository.
pub struct Session {
    id: SessionId,
    ctx: SessionContext,
    router: Option<Router>,
}

impl Session {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            id: SessionId::new(),
            ctx,
            router: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The bound kind and repository, if any.
    pub fn bound(&self) -> Option<(VcsKind, &Path)> {
        self.router.as_ref().map(|r| (r.kind(), r.repo()))
    }

    pub async fn handle(&mut self, verb: &str, args: &[String]) -> Outcome {
        let verb = verb.to_ascii_lowercase();

        match verb.as_str() {
            "quit" | "exit" => {
                return Outcome {
                    reply: Reply::ok(GOODBYE),
                    close: true,
                }
            }
            "repos" | "active" => return self.repos().into(),
            _ => {}
        }

        if self.router.is_some() && verb == Verb::Back.as_str() {
            info!(session_id = %self.id, "returned to main menu");
            self.router = None;
            return Reply::ok(BACK_REPLY).into();
        }
        if let Some(router) = &self.router {
            return router.dispatch(&verb, args).await.into();
        }

        match verb.as_str() {
            "use" | "select" => self.select(args).into(),
            "help" => Reply::ok(MENU_HELP).into(),
            other if other.parse::<Verb>().is_ok() => Reply::error(NO_VCS_SELECTED).into(),
            other => unrecognized(other).into(),
        }
    }

    fn select(&mut self, args: &[String]) -> Reply {
        let Some(raw_kind) = args.first() else {
            return Reply::error("Usage: use <git|hg|svn> [path]");
        };
        let kind: VcsKind = match raw_kind.parse() {
            Ok(kind) => kind,
            Err(_) => {
                return Reply::error(format!(
                    "Unknown VCS type: '{raw_kind}'. Choose git, hg or svn."
                ))
            }
        };

        let repo = match args.get(1) {
            Some(path) => self.ctx.repo_root.join(path),
            None => self.ctx.repo_root.clone(),
        };

        let backend = create_backend(kind, Arc::clone(&self.ctx.runner), self.ctx.registry.clone());
        info!(session_id = %self.id, kind = %kind, repo = %repo.display(), "repository selected");
        let reply = Reply::ok(format!("Using {} repository at {}.", kind.label(), repo.display()));
        self.router = Some(Router::new(backend, repo));
        reply
    }

    fn repos(&self) -> Reply {
        match reconcile(&self.ctx.registry) {
            Ok(report) => Reply::ok(report.to_string()),
            Err(e) => {
                error!(session_id = %self.id, error = %e, "reconciliation failed");
                Reply::error(format!("Registry error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvcs_store::Database;
    use rvcs_vcs::mock::ScriptedRunner;

    fn session(root: &Path) -> (Session, Arc<ScriptedRunner>, RepositoryRepo) {
        let runner = Arc::new(ScriptedRunner::new());
        let registry = RepositoryRepo::new(Database::in_memory().unwrap());
        let ctx = SessionContext {
            registry: registry.clone(),
            runner: runner.clone(),
            repo_root: root.to_path_buf(),
        };
        (Session::new(ctx), runner, registry)
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn vcs_verbs_need_a_selection() {
        let (mut s, runner, _) = session(Path::new("/srv"));
        let out = s.handle("commit", &args(&["msg"])).await;
        assert_eq!(out.reply, Reply::error(NO_VCS_SELECTED));
        assert!(!out.close);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn use_binds_and_back_unbinds() {
        let (mut s, runner, _) = session(Path::new("/srv"));

        let out = s.handle("use", &args(&["hg", "project"])).await;
        assert_eq!(out.reply.text, "Using Mercurial repository at /srv/project.");
        assert_eq!(s.bound(), Some((VcsKind::Mercurial, Path::new("/srv/project"))));

        s.handle("status", &[]).await;
        assert_eq!(runner.calls()[0].cwd, Path::new("/srv/project"));

        let out = s.handle("back", &[]).await;
        assert_eq!(out.reply.text, "Returned to main menu.");
        assert!(s.bound().is_none());

        let out = s.handle("status", &[]).await;
        assert_eq!(out.reply.text, NO_VCS_SELECTED);
    }

    #[tokio::test]
    async fn use_defaults_to_the_root_and_keeps_absolute_paths() {
        let (mut s, _, _) = session(Path::new("/srv"));
        let out = s.handle("select", &args(&["git"])).await;
        assert_eq!(out.reply.text, "Using Git repository at /srv.");

        s.handle("back", &[]).await;
        let out = s.handle("USE", &args(&["centralized", "/tmp/wc"])).await;
        assert_eq!(out.reply.text, "Using SVN repository at /tmp/wc.");
    }

    #[tokio::test]
    async fn use_rejects_unknown_kinds() {
        let (mut s, _, _) = session(Path::new("/srv"));
        let out = s.handle("use", &args(&["cvs"])).await;
        assert!(!out.reply.success);
        assert!(s.bound().is_none());

        let out = s.handle("use", &[]).await;
        assert!(!out.reply.success);
    }

    #[tokio::test]
    async fn quit_closes_from_anywhere() {
        let (mut s, _, _) = session(Path::new("/srv"));
        let out = s.handle("exit", &[]).await;
        assert_eq!(out, Outcome { reply: Reply::ok(GOODBYE), close: true });

        s.handle("use", &args(&["git"])).await;
        assert!(s.handle("quit", &[]).await.close);
    }

    #[tokio::test]
    async fn repos_reports_the_registry() {
        let dir = tempfile::tempdir().unwrap();
        let (mut s, _, registry) = session(dir.path());

        let out = s.handle("repos", &[]).await;
        assert_eq!(out.reply.text, "No active repositories found.");

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        registry.insert("root", VcsKind::Git, dir.path()).unwrap();
        s.handle("use", &args(&["git"])).await;
        let out = s.handle("active", &[]).await;
        assert!(out.reply.text.starts_with("Active Repositories:\nName: root, VCS Type: Git"));
    }

    #[tokio::test]
    async fn registry_failure_keeps_the_session_open() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| Ok(conn.execute_batch("DROP TABLE repositories")?))
            .unwrap();
        let ctx = SessionContext {
            registry: RepositoryRepo::new(db),
            runner: Arc::new(ScriptedRunner::new()),
            repo_root: PathBuf::from("/srv"),
        };
        let mut s = Session::new(ctx);

        let out = s.handle("repos", &[]).await;
        assert!(!out.reply.success);
        assert!(out.reply.text.starts_with("Registry error: "), "{}", out.reply.text);
        assert!(!out.close);

        let out = s.handle("use", &args(&["git"])).await;
        assert!(out.reply.success);
        assert_eq!(s.bound(), Some((VcsKind::Git, Path::new("/srv"))));
    }

    #[tokio::test]
    async fn help_depends_on_state() {
        let (mut s, _, _) = session(Path::new("/srv"));
        let menu = s.handle("help", &[]).await;
        assert!(menu.reply.text.contains("use <git|hg|svn> [path]"));

        s.handle("use", &args(&["git"])).await;
        let bound = s.handle("help", &[]).await;
        assert!(bound.reply.text.contains("commit [comment]"));
    }

    #[tokio::test]
    async fn unknown_menu_verb() {
        let (mut s, _, _) = session(Path::new("/srv"));
        let out = s.handle("dance", &[]).await;
        assert_eq!(
            out.reply.text,
            "Unrecognized command: 'dance'. Type 'help' for available commands."
        );
    }
}
