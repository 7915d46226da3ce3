//! Version-control backends behind one command surface.
//!
//! [`Backend`] is implemented once per tool ([`GitBackend`],
//! [`MercurialBackend`], [`SvnBackend`]). Every backend shells out through a
//! [`CommandRunner`] and records freshly initialized repositories in the
//! registry. Operations return `Result`; [`reply::reply`] turns the outcome
//! into the text sent to the client.

pub mod backend;
pub mod error;
pub mod git;
pub mod mercurial;
pub mod mock;
pub mod reconcile;
pub mod reply;
pub mod runner;
pub mod svn;

use std::sync::Arc;

use rvcs_core::VcsKind;
use rvcs_store::RepositoryRepo;

pub use backend::Backend;
pub use error::{VcsError, VcsResult};
pub use git::GitBackend;
pub use mercurial::MercurialBackend;
pub use reconcile::{reconcile, ReconcileEntry, ReconcileReport};
pub use reply::{reply, Reply};
pub use runner::{CommandRunner, ProcessRunner};
pub use svn::SvnBackend;

/// Build the backend for a kind.
pub fn create_backend(
    kind: VcsKind,
    runner: Arc<dyn CommandRunner>,
    registry: RepositoryRepo,
) -> Box<dyn Backend> {
    match kind {
        VcsKind::Git => Box::new(GitBackend::new(runner, registry)),
        VcsKind::Mercurial => Box::new(MercurialBackend::new(runner, registry)),
        VcsKind::Svn => Box::new(SvnBackend::new(runner, registry)),
    }
}
