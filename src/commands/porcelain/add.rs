use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::errors::VcsError;
use std::path::{Path, PathBuf};
use tracing::debug;

impl Repository {
    /// Stage files and directories. Tracked files that disappeared from the
    /// working tree are dropped from the index.
    pub async fn add(&mut self, paths: &[PathBuf]) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load_for_update()?;

        let result = self
            .add_paths(&mut index, paths)
            .and_then(|()| index.write_updates());
        if result.is_err() {
            index.release_lock();
        }

        result
    }

    fn add_paths(&self, index: &mut Index, paths: &[PathBuf]) -> anyhow::Result<()> {
        let mut pathspecs = Vec::with_capacity(paths.len());
        for path in paths {
            let relative = self.workspace().relativize(path)?;
            if !self.workspace().exists(&relative) && !index.is_tracked(&relative) {
                return Err(VcsError::PathspecNotMatched(path.display().to_string()).into());
            }
            pathspecs.push(relative);
        }

        for pathspec in pathspecs {
            self.drop_deleted_files(index, &pathspec)?;

            if !self.workspace().exists(&pathspec) {
                continue;
            }
            for file in self.workspace().list_files(Some(&pathspec))? {
                self.add_file(index, &file)?;
            }
        }

        Ok(())
    }

    fn drop_deleted_files(&self, index: &mut Index, pathspec: &Path) -> anyhow::Result<()> {
        for tracked in index.entries_under(pathspec) {
            if self.workspace().stat_if_file(&tracked)?.is_none() {
                debug!(path = %tracked.display(), "dropping deleted file");
                index.remove(&tracked);
            }
        }

        Ok(())
    }

    fn add_file(&self, index: &mut Index, path: &Path) -> anyhow::Result<()> {
        let stat = self.workspace().stat_file(path)?;

        if let Some(entry) = index.entry_by_path(path)
            && entry.stat_match(&stat)
            && entry.times_match(&stat)
        {
            return Ok(());
        }

        let data = self.workspace().read_file(path)?;
        let oid = index.stage(self.database(), path, data, stat)?;
        debug!(path = %path.display(), %oid, "staged");

        Ok(())
    }
}
