use crate::artifacts::diff::tree_diff::ChangeSet;
use crate::artifacts::status::status_info::StatusInfo;
use crate::errors::VcsError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConflictType {
    /// Tracked path with staged or unstaged changes
    StaleFile,
    /// Untracked file in the way of a file the target brings in
    UntrackedOverwritten,
}

impl ConflictType {
    pub fn header(&self) -> &'static str {
        match self {
            ConflictType::StaleFile => {
                "your local changes to the following files would be overwritten by checkout"
            }
            ConflictType::UntrackedOverwritten => {
                "the following untracked working tree files would be overwritten by checkout"
            }
        }
    }
}

/// Paths that block a checkout, grouped by reason
#[derive(Debug, Default)]
pub struct Conflicts {
    paths: BTreeMap<ConflictType, BTreeSet<PathBuf>>,
}

impl Conflicts {
    /// `changes` goes from HEAD to the target, with type changes expanded.
    pub fn detect(status: &StatusInfo, changes: &ChangeSet) -> Self {
        let mut conflicts = Conflicts::default();

        for path in status.changed_files().keys() {
            conflicts.push(ConflictType::StaleFile, path);
        }

        let incoming = changes
            .iter()
            .filter(|(_, change)| change.new_entry().is_some())
            .map(|(path, _)| path.as_path())
            .collect::<Vec<_>>();

        for untracked in status.untracked_files() {
            if incoming
                .iter()
                .any(|incoming| overlaps(untracked, incoming))
            {
                conflicts.push(ConflictType::UntrackedOverwritten, untracked);
            }
        }

        conflicts
    }

    fn push(&mut self, conflict_type: ConflictType, path: &Path) {
        self.paths
            .entry(conflict_type)
            .or_default()
            .insert(path.to_path_buf());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// `Ok` when nothing blocks the checkout, else `UncommittedChanges` with
    /// every offending path.
    pub fn into_result(self) -> Result<(), VcsError> {
        if self.is_empty() {
            return Ok(());
        }

        for (conflict_type, paths) in &self.paths {
            warn!(count = paths.len(), "{}", conflict_type.header());
        }
        let paths = self
            .paths
            .into_values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Err(VcsError::UncommittedChanges(paths))
    }
}

/// Same path, or one is a directory holding the other.
fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
