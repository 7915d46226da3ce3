use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use rvcs_core::verb::help_text;
use rvcs_core::{FileArgs, VcsKind, Verb};
use rvcs_vcs::{reply, Backend, Reply, VcsError, VcsResult};

pub const BACK_REPLY: &str = "Returned to main menu.";

pub fn unrecognized(verb: &str) -> Reply {
    Reply::error(format!(
        "Unrecognized command: '{verb}'. Type 'help' for available commands."
    ))
}

/// Routes verbs to one backend bound to one repository. Both are fixed for
/// the router's lifetime; switching means building a new router.
pub struct Router {
    backend: Box<dyn Backend>,
    repo: PathBuf,
}

impl Router {
    pub fn new(backend: Box<dyn Backend>, repo: PathBuf) -> Self {
        Self { backend, repo }
    }

    pub fn kind(&self) -> VcsKind {
        self.backend.kind()
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Normalize arguments, call the backend, and turn the outcome into a
    /// reply. Never fails.
    #[instrument(skip(self, args), fields(kind = %self.kind(), args = args.len()))]
    pub async fn dispatch(&self, verb: &str, args: &[String]) -> Reply {
        let Ok(parsed) = verb.parse::<Verb>() else {
            debug!("unrecognized verb");
            return unrecognized(verb);
        };

        match parsed {
            Verb::Help => Reply::ok(help_text()),
            Verb::Back => Reply::ok(BACK_REPLY),
            other => reply(other, self.call(other, args).await),
        }
    }

    async fn call(&self, verb: Verb, args: &[String]) -> VcsResult {
        let repo = self.repo.as_path();
        let backend = self.backend.as_ref();

        match verb {
            Verb::Add => {
                let files = FileArgs::normalize((!args.is_empty()).then_some(args));
                backend.add(repo, &files).await
            }
            Verb::AddAll => backend.add_all(repo).await,
            Verb::Commit => {
                let comment = args.join(" ");
                let comment = (!comment.trim().is_empty()).then_some(comment.as_str());
                backend.commit(repo, comment).await
            }
            Verb::Update => backend.update(repo).await,
            Verb::Push => backend.push(repo).await,
            Verb::Pull => backend.pull(repo).await,
            Verb::Fetch => backend.fetch(repo).await,
            Verb::Init => {
                let name = self.repository_name(args)?;
                backend.init_repo(&name, repo).await
            }
            Verb::Log => backend.log(repo).await,
            Verb::Status => backend.status(repo).await,
            Verb::List => backend.list(repo).await,
            Verb::Patch => backend.patch(repo, required(args, 0, "patch file")?).await,
            Verb::Branch => backend.branch(repo, required(args, 0, "branch name")?).await,
            Verb::Merge => backend.merge(repo, required(args, 0, "branch name")?).await,
            Verb::Tag => {
                let name = required(args, 0, "tag name")?;
                backend.tag(repo, name, args.get(1).map(String::as_str)).await
            }
            Verb::Help | Verb::Back => Ok(String::new()),
        }
    }

    /// The first argument, or the directory name. Subversion has no sensible
    /// default since the name is the checkout URL.
    fn repository_name(&self, args: &[String]) -> Result<String, VcsError> {
        if let Some(name) = args.first().filter(|a| !a.is_empty()) {
            return Ok(name.clone());
        }
        if self.kind() == VcsKind::Svn {
            return Err(VcsError::MissingArgument("repository name"));
        }
        self.repo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(VcsError::MissingArgument("repository name"))
    }
}

fn required<'a>(args: &'a [String], idx: usize, what: &'static str) -> Result<&'a str, VcsError> {
    args.get(idx)
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .ok_or(VcsError::MissingArgument(what))
}
