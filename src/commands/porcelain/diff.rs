use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::diff::tree_diff::{ChangeSet, DiffFilter, DiffOptions, TreeChange, TreeDiff};
use crate::artifacts::diff::tree_source::{IndexTree, StoredTree, WorkspaceTree};
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct DiffCommandOptions {
    /// HEAD against the index
    pub cached: bool,
    pub filter: Option<DiffFilter>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Repository {
    /// Name and status of changed paths.
    ///
    /// No revision compares the index with the working tree, `cached` HEAD
    /// with the index, one revision that commit with the working tree and two
    /// revisions the two commits.
    pub async fn diff(&mut self, options: &DiffCommandOptions) -> anyhow::Result<ChangeSet> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;
        let index: &Index = &index;

        let database = self.database();
        let changes = match (&options.from, &options.to) {
            (Some(from), Some(to)) => {
                let from = StoredTree::of_commit(database, Some(&self.resolve_commit(from)?))?;
                let to = StoredTree::of_commit(database, Some(&self.resolve_commit(to)?))?;
                TreeDiff::compare(&from, &to, DiffOptions::default())?
            }
            (Some(from), None) => {
                let from = StoredTree::of_commit(database, Some(&self.resolve_commit(from)?))?;
                let changes = TreeDiff::compare(
                    &from,
                    &WorkspaceTree::new(self.workspace(), Some(index)),
                    DiffOptions::expanded(),
                )?;
                without_untracked(changes, index)
            }
            (None, _) if options.cached => {
                let head = self.refs().read_head()?;
                TreeDiff::compare(
                    &StoredTree::of_commit(database, head.as_ref())?,
                    &IndexTree::new(index),
                    DiffOptions::default(),
                )?
            }
            (None, _) => {
                let changes = TreeDiff::compare(
                    &IndexTree::new(index),
                    &WorkspaceTree::new(self.workspace(), Some(index)),
                    DiffOptions::expanded(),
                )?;
                without_untracked(changes, index)
            }
        };

        self.write_name_status(&changes, options.filter)?;

        Ok(changes)
    }

    /// Commit header followed by its changes against the first parent.
    pub async fn show(&mut self, revision: Option<&str>) -> anyhow::Result<ObjectId> {
        let oid = self.resolve_commit(revision.unwrap_or("HEAD"))?;
        let commit = self.database().parse_commit(&oid)?;

        let parent_tree = StoredTree::of_commit(self.database(), commit.parent())?;
        let commit_tree = StoredTree::new(self.database(), Some(commit.tree_oid().clone()));
        let changes = TreeDiff::compare(&parent_tree, &commit_tree, DiffOptions::default())?;

        self.show_commit_medium(&oid, &commit)?;
        if !changes.is_empty() {
            writeln!(self.writer())?;
        }
        self.write_name_status(&changes, None)?;

        Ok(oid)
    }

    fn write_name_status(&self, changes: &ChangeSet, filter: Option<DiffFilter>) -> anyhow::Result<()> {
        for (path, change) in changes {
            if let Some(filter) = filter
                && !change.matches_filter(filter)
            {
                continue;
            }
            writeln!(self.writer(), "{}\t{}", change.status_char(), path.display())?;
        }

        Ok(())
    }
}

/// Working tree files unknown to the index are not part of a diff.
fn without_untracked(changes: ChangeSet, index: &Index) -> ChangeSet {
    changes
        .into_iter()
        .filter(|(path, change)| {
            !matches!(change, TreeChange::Added(_)) || index.is_tracked_file(path)
        })
        .collect()
}
