use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::checkout::conflict::Conflicts;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::diff::tree_diff::{DiffOptions, TreeDiff};
use crate::artifacts::diff::tree_source::{StoredTree, WorkspaceTree};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::status::status_info::Status;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

impl Repository {
    /// Move HEAD, the index and the working tree to `target`.
    ///
    /// Without `force`, local changes to tracked files and untracked files
    /// in the way of the target abort the checkout before anything is
    /// touched. A branch name attaches HEAD; any other revision detaches it.
    pub async fn checkout(&mut self, target: &str, force: bool) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load_for_update()?;

        let result = self
            .checkout_with_index(&mut index, target, force)
            .and_then(|oid| index.write_updates().map(|()| oid));
        if result.is_err() {
            index.release_lock();
            return result;
        }

        let target_oid = result?;
        let branch = self.target_branch(target)?;
        match &branch {
            Some(branch) => self.refs().set_head_to_branch(branch)?,
            None => self.refs().set_head_to_oid(&target_oid)?,
        }
        info!(target, oid = %target_oid, "checked out");

        match branch {
            Some(branch) => writeln!(self.writer(), "Switched to branch '{branch}'")?,
            None => {
                let commit = self.database().parse_commit(&target_oid)?;
                writeln!(
                    self.writer(),
                    "HEAD is now at {} {}",
                    target_oid.to_short_oid(),
                    commit.short_message()
                )?;
            }
        }

        Ok(target_oid)
    }

    fn checkout_with_index(
        &self,
        index: &mut Index,
        target: &str,
        force: bool,
    ) -> anyhow::Result<ObjectId> {
        let database = self.database();
        let target_oid = self.resolve_commit(target)?;
        let head = self.refs().read_head()?;

        let head_tree = StoredTree::of_commit(database, head.as_ref())?;
        let target_tree = StoredTree::of_commit(database, Some(&target_oid))?;
        let target_files = target_tree.files()?;

        let migration = if force {
            let workspace_tree = WorkspaceTree::new(self.workspace(), Some(&*index));
            let workspace_changes =
                TreeDiff::compare(&workspace_tree, &target_tree, DiffOptions::expanded())?;

            let mut tracked = head_tree.files()?.into_keys().collect::<BTreeSet<PathBuf>>();
            tracked.extend(index.entries().map(|entry| entry.name.clone()));

            Migration::plan_forced(database, &workspace_changes, tracked, target_files)
        } else {
            let changes = TreeDiff::compare(&head_tree, &target_tree, DiffOptions::expanded())?;
            let status = Status::new(self).inspect(index)?;
            Conflicts::detect(&status, &changes).into_result()?;

            Migration::plan(database, &changes, target_files)
        };

        self.workspace().apply_migration(&migration)?;
        let entries = migration.index_entries(index, self.workspace())?;
        index.replace_all(entries);

        Ok(target_oid)
    }

    /// The branch to attach HEAD to, when `target` names an existing branch.
    fn target_branch(&self, target: &str) -> anyhow::Result<Option<BranchName>> {
        let Ok(branch) = BranchName::try_parse(target) else {
            return Ok(None);
        };

        Ok(self.refs().read_branch(&branch)?.map(|_| branch))
    }
}
