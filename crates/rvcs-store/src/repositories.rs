use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rvcs_core::VcsKind;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// One managed repository. Rows are never updated, only inserted and removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRow {
    pub id: i64,
    pub name: String,
    /// Raw `vcs_type` text. Rows written by other tools may hold kinds this
    /// server does not know, so parsing is left to the caller.
    pub kind: String,
    pub created_at: String,
    pub path: String,
}

impl RepositoryRow {
    pub fn vcs_kind(&self) -> Result<VcsKind, StoreError> {
        row_helpers::parse_enum(&self.kind, "repositories", "vcs_type")
    }

    pub fn repo_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

/// Registry of managed repositories.
#[derive(Clone)]
pub struct RepositoryRepo {
    db: Database,
}

impl RepositoryRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a repository. Names are not checked for uniqueness.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn insert(&self, name: &str, kind: VcsKind, path: &Path) -> Result<RepositoryRow, StoreError> {
        let now = Utc::now().to_rfc3339();
        let path = path.to_string_lossy().into_owned();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO repositories (name, vcs_type, created_at, repo_path) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![name, kind.as_str(), now, path],
            )?;

            Ok(RepositoryRow {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                kind: kind.as_str().to_string(),
                created_at: now,
                path,
            })
        })
    }

    /// All records in insertion order.
    #[instrument(skip(self))]
    pub fn list_active(&self) -> Result<Vec<RepositoryRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, vcs_type, created_at, repo_path FROM repositories ORDER BY id",
            )?;
            let mut rows = stmt.query([])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_repository(row)?);
            }
            Ok(results)
        })
    }

    /// Delete every record with exactly this name. Returns how many went.
    #[instrument(skip(self))]
    pub fn remove(&self, name: &str) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM repositories WHERE name = ?1", [name])?;
            Ok(removed)
        })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM repositories", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }
}

fn row_to_repository(row: &rusqlite::Row<'_>) -> Result<RepositoryRow, StoreError> {
    Ok(RepositoryRow {
        id: row_helpers::get(row, 0, "repositories", "id")?,
        name: row_helpers::get(row, 1, "repositories", "name")?,
        kind: row_helpers::get(row, 2, "repositories", "vcs_type")?,
        created_at: row_helpers::get(row, 3, "repositories", "created_at")?,
        path: row_helpers::get(row, 4, "repositories", "repo_path")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> RepositoryRepo {
        RepositoryRepo::new(Database::in_memory().unwrap())
    }

    #[test]
    fn insert_assigns_id_and_timestamp() {
        let repo = test_repo();
        let row = repo.insert("proj", VcsKind::Git, Path::new("/tmp/proj")).unwrap();
        assert!(row.id > 0);
        assert_eq!(row.name, "proj");
        assert_eq!(row.kind, "Git");
        assert_eq!(row.path, "/tmp/proj");
        assert!(chrono::DateTime::parse_from_rfc3339(&row.created_at).is_ok());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let repo = test_repo();
        repo.insert("b", VcsKind::Mercurial, Path::new("/b")).unwrap();
        repo.insert("a", VcsKind::Svn, Path::new("/a")).unwrap();
        repo.insert("c", VcsKind::Git, Path::new("/c")).unwrap();

        let names: Vec<String> = repo.list_active().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn listed_rows_round_trip_kind() {
        let repo = test_repo();
        repo.insert("svn-proj", VcsKind::Svn, Path::new("/srv/wc")).unwrap();
        let rows = repo.list_active().unwrap();
        assert_eq!(rows[0].kind, "SVN");
        assert_eq!(rows[0].vcs_kind().unwrap(), VcsKind::Svn);
        assert_eq!(rows[0].repo_path(), PathBuf::from("/srv/wc"));
    }

    #[test]
    fn duplicate_names_are_accepted() {
        let repo = test_repo();
        let first = repo.insert("dup", VcsKind::Git, Path::new("/one")).unwrap();
        let second = repo.insert("dup", VcsKind::Git, Path::new("/two")).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn remove_deletes_every_match() {
        let repo = test_repo();
        repo.insert("dup", VcsKind::Git, Path::new("/one")).unwrap();
        repo.insert("keep", VcsKind::Git, Path::new("/keep")).unwrap();
        repo.insert("dup", VcsKind::Mercurial, Path::new("/two")).unwrap();

        assert_eq!(repo.remove("dup").unwrap(), 2);
        let rows = repo.list_active().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "keep");
    }

    #[test]
    fn remove_matches_exact_name_only() {
        let repo = test_repo();
        repo.insert("proj", VcsKind::Git, Path::new("/p")).unwrap();
        assert_eq!(repo.remove("pro").unwrap(), 0);
        assert_eq!(repo.remove("PROJ").unwrap(), 0);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn unknown_kind_is_listed_but_does_not_parse() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO repositories (name, vcs_type, created_at, repo_path) VALUES ('old', 'CVS', 'then', '/old')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let rows = RepositoryRepo::new(db).list_active().unwrap();
        assert_eq!(rows[0].kind, "CVS");
        assert!(rows[0].vcs_kind().is_err());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        let repo = RepositoryRepo::new(Database::open(&path).unwrap());
        repo.insert("persisted", VcsKind::Git, Path::new("/p")).unwrap();
        drop(repo);

        let repo = RepositoryRepo::new(Database::open(&path).unwrap());
        let rows = repo.list_active().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "persisted");
    }
}
