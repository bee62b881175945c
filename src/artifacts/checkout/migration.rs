//! Planned working tree changes for a checkout
//!
//! A migration is computed in full before anything on disk is touched. It
//! lists the paths to delete and the files to write; applying it removes
//! first and writes second, so a file can take the place of a directory and
//! the other way round.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_diff::{ChangeSet, TreeChange};
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

pub type FileMap = BTreeMap<PathBuf, DatabaseEntry>;

#[derive(Debug)]
pub struct Migration<'d> {
    database: &'d Database,
    deletions: BTreeSet<PathBuf>,
    writes: FileMap,
    /// Every file of the target tree
    target_files: FileMap,
}

impl<'d> Migration<'d> {
    /// Plan from the expanded diff between the current commit and the target.
    /// Files equal on both sides are not touched.
    pub fn plan(database: &'d Database, changes: &ChangeSet, target_files: FileMap) -> Self {
        let mut migration = Migration {
            database,
            deletions: BTreeSet::new(),
            writes: FileMap::new(),
            target_files,
        };

        for (path, change) in changes {
            migration.record(path, change);
        }
        debug!(
            deletions = migration.deletions.len(),
            writes = migration.writes.len(),
            "checkout planned"
        );

        migration
    }

    /// Plan that makes the working tree match the target whatever its
    /// state. `workspace_changes` goes from the working tree to the target;
    /// `tracked` are the paths known to HEAD or the index, which are removed
    /// when the target lacks them. Other untracked files are left alone.
    pub fn plan_forced(
        database: &'d Database,
        workspace_changes: &ChangeSet,
        tracked: impl IntoIterator<Item = PathBuf>,
        target_files: FileMap,
    ) -> Self {
        let mut migration = Migration {
            database,
            deletions: BTreeSet::new(),
            writes: FileMap::new(),
            target_files,
        };

        for (path, change) in workspace_changes {
            if let Some(entry) = change.new_entry() {
                migration.writes.insert(path.clone(), entry.clone());
            }
        }

        migration.deletions = tracked
            .into_iter()
            .filter(|path| !migration.target_files.contains_key(path))
            .collect();
        debug!(
            deletions = migration.deletions.len(),
            writes = migration.writes.len(),
            "forced checkout planned"
        );

        migration
    }

    fn record(&mut self, path: &Path, change: &TreeChange) {
        match change {
            TreeChange::Removed(_) => {
                self.deletions.insert(path.to_path_buf());
            }
            TreeChange::Added(entry) | TreeChange::Modified { new: entry, .. } => {
                self.writes.insert(path.to_path_buf(), entry.clone());
            }
            // Expanded diffs never carry type changes; their leaves are
            // already listed as removals and additions.
            TreeChange::TypeChanged { .. } => {}
        }
    }

    pub fn deletions(&self) -> impl Iterator<Item = &PathBuf> {
        self.deletions.iter()
    }

    pub fn writes(&self) -> impl Iterator<Item = (&PathBuf, &DatabaseEntry)> {
        self.writes.iter()
    }

    pub fn load_blob(&self, oid: &ObjectId) -> anyhow::Result<Blob> {
        self.database.parse_blob(oid)
    }

    /// Index entries for the target tree once the migration has been applied.
    /// Entries for files left untouched keep their cached stat data.
    pub fn index_entries(
        &self,
        index: &Index,
        workspace: &Workspace,
    ) -> anyhow::Result<Vec<IndexEntry>> {
        self.target_files
            .iter()
            .map(|(path, entry)| {
                if !self.writes.contains_key(path)
                    && let Some(existing) = index.entry_by_path(path)
                    && existing.oid == entry.oid
                    && existing.mode() == entry.mode
                {
                    return Ok(existing.clone());
                }

                let mut stat = workspace.stat_file(path)?;
                stat.mode = entry.mode;
                Ok(IndexEntry::new(path.clone(), entry.oid.clone(), stat))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::EntryMode;
    use crate::artifacts::objects::object::hash_bytes;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    fn entry(content: &str) -> DatabaseEntry {
        DatabaseEntry::new(hash_bytes(content.as_bytes()), EntryMode::default())
    }

    #[test]
    fn removals_become_deletions_and_the_rest_writes() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let changes = ChangeSet::from([
            (PathBuf::from("gone.txt"), TreeChange::Removed(entry("old"))),
            (PathBuf::from("new.txt"), TreeChange::Added(entry("new"))),
            (
                PathBuf::from("edit.txt"),
                TreeChange::Modified {
                    old: entry("a"),
                    new: entry("b"),
                },
            ),
        ]);

        let migration = Migration::plan(&database, &changes, FileMap::new());

        assert_eq!(
            migration.deletions().cloned().collect::<Vec<_>>(),
            vec![PathBuf::from("gone.txt")]
        );
        assert_eq!(
            migration.writes().map(|(path, _)| path.clone()).collect::<Vec<_>>(),
            vec![PathBuf::from("edit.txt"), PathBuf::from("new.txt")]
        );
    }

    #[test]
    fn forced_plan_deletes_tracked_paths_missing_from_target() {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        let target = FileMap::from([(PathBuf::from("keep.txt"), entry("keep"))]);
        let changes = ChangeSet::from([
            (PathBuf::from("keep.txt"), TreeChange::Added(entry("keep"))),
            (PathBuf::from("scratch.txt"), TreeChange::Removed(entry("scratch"))),
        ]);

        let migration = Migration::plan_forced(
            &database,
            &changes,
            vec![PathBuf::from("keep.txt"), PathBuf::from("tracked.txt")],
            target,
        );

        assert_eq!(
            migration.deletions().cloned().collect::<Vec<_>>(),
            vec![PathBuf::from("tracked.txt")]
        );
        assert_eq!(migration.writes().count(), 1);
    }
}
