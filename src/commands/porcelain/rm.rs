use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_source::{StoredTree, WorkspaceTree};
use crate::errors::VcsError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RmOptions {
    /// Unstage only; the working tree file stays
    pub cached: bool,
    /// Skip the local changes check
    pub force: bool,
    /// Allow directories
    pub recursive: bool,
}

impl Repository {
    /// Remove paths from the index and, unless `cached`, from the working
    /// tree. Nothing changes when any path is refused. A directory that took
    /// the place of a tracked file is never deleted.
    pub async fn rm(&mut self, paths: &[PathBuf], options: RmOptions) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load_for_update()?;

        let targets = match self
            .unstage_paths(&mut index, paths, options)
            .and_then(|targets| index.write_updates().map(|()| targets))
        {
            Ok(targets) => targets,
            Err(err) => {
                index.release_lock();
                return Err(err);
            }
        };

        for target in &targets {
            if !options.cached {
                self.workspace().remove_file(target)?;
            }
            writeln!(self.writer(), "rm '{}'", target.display())?;
        }

        Ok(())
    }

    /// Check every path and drop it from the index. The working tree is only
    /// touched once the new index is written.
    fn unstage_paths(
        &self,
        index: &mut Index,
        paths: &[PathBuf],
        options: RmOptions,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let mut targets = Vec::new();

        for path in paths {
            let relative = self.workspace().relativize(path)?;
            let tracked = index.entries_under(&relative);
            if tracked.is_empty() {
                return Err(VcsError::PathspecNotMatched(path.display().to_string()).into());
            }
            if index.is_tracked_directory(&relative) && !options.recursive {
                anyhow::bail!("not removing '{}' recursively without -r", path.display());
            }
            targets.extend(tracked);
        }
        targets.sort();
        targets.dedup();

        if !options.force {
            let blocked = self.files_with_local_changes(index, &targets, options.cached)?;
            if !blocked.is_empty() {
                return Err(VcsError::UncommittedChanges(blocked).into());
            }
        }

        for target in &targets {
            index.unstage(target);
        }

        Ok(targets)
    }

    /// Files whose removal would lose content found nowhere else.
    ///
    /// A full removal needs the staged content to match HEAD and the working
    /// copy to match the index. Unstaging keeps the file, so it only needs
    /// one of the two.
    fn files_with_local_changes(
        &self,
        index: &Index,
        targets: &[PathBuf],
        cached: bool,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let head = self.refs().read_head()?;
        let head_files: BTreeMap<PathBuf, DatabaseEntry> =
            StoredTree::of_commit(self.database(), head.as_ref())?.files()?;
        let workspace_tree = WorkspaceTree::new(self.workspace(), Some(index));

        let mut blocked = Vec::new();
        for target in targets {
            let Some(entry) = index.entry_by_path(target) else {
                continue;
            };

            let staged_matches_head = head_files
                .get(target)
                .is_some_and(|head_entry| head_entry.oid == entry.oid && head_entry.mode == entry.mode());
            let working_matches_index = match self.workspace().stat_if_file(target)? {
                Some(stat) => workspace_tree.file_oid(target, &stat)? == entry.oid,
                // a directory in place of the file holds untracked content
                None => !self.workspace().is_directory(target),
            };

            let safe = if cached {
                staged_matches_head || working_matches_index
            } else {
                staged_matches_head && working_matches_index
            };
            if !safe {
                blocked.push(target.clone());
            }
        }

        Ok(blocked)
    }
}
