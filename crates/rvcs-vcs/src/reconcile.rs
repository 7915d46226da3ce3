//! Cross-check registry records against the disk.
//!
//! A record whose metadata marker is gone is pruned (by name, so every record
//! sharing that name goes with it). Records of kinds this server does not
//! know are reported and kept.

use std::collections::HashSet;
use std::fmt;

use tracing::{info, instrument, warn};

use rvcs_store::{RepositoryRepo, RepositoryRow, StoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileEntry {
    Present { name: String, kind: String, path: String },
    Pruned { name: String, kind: String, path: String },
    Unsupported { name: String, kind: String, path: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub entries: Vec<ReconcileEntry>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pruned(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, ReconcileEntry::Pruned { .. }))
            .count()
    }
}

impl fmt::Display for ReconcileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Self::Present { name, kind, path }
        | Self::Pruned { name, kind, path }
        | Self::Unsupported { name, kind, path }) = self;
        write!(f, "Name: {name}, VCS Type: {kind}, Path: {path}")?;
        match self {
            Self::Present { .. } => Ok(()),
            Self::Pruned { .. } => {
                write!(f, "\nRepository at {path} does not exist. Removing from the database.")
            }
            Self::Unsupported { .. } => write!(f, "\nUnsupported VCS Type: {kind}"),
        }
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("No active repositories found.");
        }
        f.write_str("Active Repositories:")?;
        for entry in &self.entries {
            write!(f, "\n{entry}")?;
        }
        Ok(())
    }
}

#[instrument(skip(registry))]
pub fn reconcile(registry: &RepositoryRepo) -> Result<ReconcileReport, StoreError> {
    let mut report = ReconcileReport::default();
    let mut pruned_names = HashSet::new();

    for row in registry.list_active()? {
        // Already deleted alongside an earlier record of the same name.
        if pruned_names.contains(&row.name) {
            continue;
        }
        let name = row.name.clone();
        let entry = check(registry, row)?;
        if matches!(entry, ReconcileEntry::Pruned { .. }) {
            pruned_names.insert(name);
        }
        report.entries.push(entry);
    }

    if report.pruned() > 0 {
        info!(pruned = report.pruned(), "registry reconciled");
    }
    Ok(report)
}

fn check(registry: &RepositoryRepo, row: RepositoryRow) -> Result<ReconcileEntry, StoreError> {
    let Ok(kind) = row.vcs_kind() else {
        warn!(name = %row.name, kind = %row.kind, "unsupported kind in registry");
        return Ok(ReconcileEntry::Unsupported {
            name: row.name,
            kind: row.kind,
            path: row.path,
        });
    };

    if kind.is_initialized(&row.repo_path()) {
        return Ok(ReconcileEntry::Present {
            name: row.name,
            kind: row.kind,
            path: row.path,
        });
    }

    let removed = registry.remove(&row.name)?;
    info!(name = %row.name, path = %row.path, removed, "pruned vanished repository");
    Ok(ReconcileEntry::Pruned {
        name: row.name,
        kind: row.kind,
        path: row.path,
    })
}
