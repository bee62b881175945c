use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{DiffOptions, TreeChange, TreeDiff};
use crate::artifacts::diff::tree_source::{IndexTree, StoredTree, WorkspaceTree};
use crate::artifacts::status::file_change::{FileChange, IndexChangeType, WorkspaceChangeType};
use derive_new::new;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInfo {
    changed_files: BTreeMap<PathBuf, FileChange>,
    untracked_files: BTreeSet<PathBuf>,
}

impl StatusInfo {
    /// Tracked paths that differ from HEAD in the index, the working tree,
    /// or both.
    pub fn changed_files(&self) -> &BTreeMap<PathBuf, FileChange> {
        &self.changed_files
    }

    pub fn untracked_files(&self) -> &BTreeSet<PathBuf> {
        &self.untracked_files
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        !self.changed_files.is_empty()
    }

    /// Short format: `XY path` per changed path, then `?? path` per
    /// untracked file.
    pub fn short_lines(&self) -> Vec<String> {
        let changed = self
            .changed_files
            .iter()
            .map(|(path, change)| format!("{change} {}", path.display()));
        let untracked = self
            .untracked_files
            .iter()
            .map(|path| format!("?? {}", path.display()));

        changed.chain(untracked).collect()
    }
}

#[derive(new)]
pub struct Status<'r> {
    repository: &'r Repository,
}

impl<'r> Status<'r> {
    /// Compare HEAD with the index, then the index with the working tree.
    /// Reads only; the index on disk is left untouched.
    pub fn inspect(&self, index: &Index) -> anyhow::Result<StatusInfo> {
        let database = self.repository.database();
        let head = self.repository.refs().read_head()?;

        let head_tree = StoredTree::of_commit(database, head.as_ref())?;
        let index_tree = IndexTree::new(index);
        let workspace_tree = WorkspaceTree::new(self.repository.workspace(), Some(index));

        let staged = TreeDiff::compare(&head_tree, &index_tree, DiffOptions::expanded())?;
        let unstaged = TreeDiff::compare(&index_tree, &workspace_tree, DiffOptions::expanded())?;
        debug!(staged = staged.len(), unstaged = unstaged.len(), "status computed");

        let mut info = StatusInfo::default();

        for (path, change) in staged.iter() {
            info.changed_files.entry(path.clone()).or_default().index_change =
                IndexChangeType::from(change);
        }

        for (path, change) in unstaged {
            let workspace_change = match change {
                TreeChange::Added(_) => {
                    info.untracked_files.insert(path);
                    continue;
                }
                TreeChange::Removed(_) => WorkspaceChangeType::Deleted,
                TreeChange::Modified { .. } | TreeChange::TypeChanged { .. } => {
                    WorkspaceChangeType::Modified
                }
            };
            info.changed_files.entry(path).or_default().workspace_change = workspace_change;
        }

        Ok(info)
    }
}
