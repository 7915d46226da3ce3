use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The three version-control tools the router can drive.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum VcsKind {
    Git,
    Mercurial,
    /// Subversion, the centralized backend.
    Svn,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown VCS kind: {0}")]
pub struct UnknownKind(pub String);

impl VcsKind {
    pub const ALL: [VcsKind; 3] = [Self::Git, Self::Mercurial, Self::Svn];

    /// Text stored in the registry's `vcs_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "Git",
            Self::Mercurial => "Mercurial",
            Self::Svn => "SVN",
        }
    }

    /// Prefix used in human-readable replies.
    pub fn label(self) -> &'static str {
        self.as_str()
    }

    /// Hidden bookkeeping directory that marks an initialized working copy.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Git => ".git",
            Self::Mercurial => ".hg",
            Self::Svn => ".svn",
        }
    }

    /// Executable invoked for this kind.
    pub fn program(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Mercurial => "hg",
            Self::Svn => "svn",
        }
    }

    pub fn marker_path(self, repo: &Path) -> PathBuf {
        repo.join(self.marker())
    }

    pub fn is_initialized(self, repo: &Path) -> bool {
        self.marker_path(repo).exists()
    }
}

impl std::fmt::Display for VcsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VcsKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "git" => Ok(Self::Git),
            "mercurial" | "hg" => Ok(Self::Mercurial),
            "svn" | "subversion" | "centralized" => Ok(Self::Svn),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_text_parses_back() {
        for kind in VcsKind::ALL {
            assert_eq!(kind.as_str().parse::<VcsKind>().unwrap(), kind);
        }
    }

    #[test]
    fn aliases_are_accepted() {
        assert_eq!("hg".parse::<VcsKind>().unwrap(), VcsKind::Mercurial);
        assert_eq!("GIT".parse::<VcsKind>().unwrap(), VcsKind::Git);
        assert_eq!(" subversion ".parse::<VcsKind>().unwrap(), VcsKind::Svn);
        assert_eq!("Centralized".parse::<VcsKind>().unwrap(), VcsKind::Svn);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "bazaar".parse::<VcsKind>().unwrap_err();
        assert_eq!(err, UnknownKind("bazaar".into()));
        assert_eq!(err.to_string(), "unknown VCS kind: bazaar");
    }

    #[test]
    fn markers_and_programs() {
        assert_eq!(VcsKind::Git.marker(), ".git");
        assert_eq!(VcsKind::Mercurial.marker(), ".hg");
        assert_eq!(VcsKind::Svn.marker(), ".svn");
        assert_eq!(VcsKind::Mercurial.program(), "hg");
        assert_eq!(
            VcsKind::Git.marker_path(Path::new("/tmp/proj")),
            PathBuf::from("/tmp/proj/.git")
        );
    }

    #[test]
    fn is_initialized_checks_marker_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!VcsKind::Git.is_initialized(dir.path()));

        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(VcsKind::Git.is_initialized(dir.path()));
        assert!(!VcsKind::Mercurial.is_initialized(dir.path()));
    }
}
