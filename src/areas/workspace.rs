//! Working tree I/O
//!
//! All paths handed in and out are relative to the repository root. The
//! `.vcs` directory is invisible from here.

use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::VcsError;
use anyhow::Context;
use bytes::Bytes;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const REPOSITORY_DIR: &str = ".vcs";

#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self, file_path: &Path) -> bool {
        self.path.join(file_path).symlink_metadata().is_ok()
    }

    pub fn read_file(&self, file_path: &Path) -> anyhow::Result<Bytes> {
        let full_path = self.path.join(file_path);

        std::fs::read(&full_path)
            .map(Bytes::from)
            .with_context(|| format!("unable to read {}", file_path.display()))
    }

    /// Turn a user supplied path (absolute or relative to the current
    /// directory) into a path relative to the repository root.
    pub fn relativize(&self, user_path: &Path) -> anyhow::Result<PathBuf> {
        let mut absolute = PathBuf::new();
        for component in std::env::current_dir()?.join(user_path).components() {
            match component {
                Component::ParentDir => {
                    absolute.pop();
                }
                Component::CurDir => {}
                other => absolute.push(other),
            }
        }

        let canonical_root = std::fs::canonicalize(&self.path)?;
        absolute
            .strip_prefix(&self.path)
            .or_else(|_| absolute.strip_prefix(&canonical_root))
            .map(Path::to_path_buf)
            .map_err(|_| VcsError::PathspecNotMatched(user_path.display().to_string()).into())
    }

    /// Files below `root_file_path` (the whole tree when `None`), relative to
    /// the repository root and sorted.
    pub fn list_files(&self, root_file_path: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let start = match root_file_path {
            Some(path) => self.path.join(path),
            None => self.path.to_path_buf(),
        };

        let metadata = std::fs::symlink_metadata(&start).map_err(|_| {
            VcsError::PathspecNotMatched(
                root_file_path.unwrap_or(Path::new(".")).display().to_string(),
            )
        })?;

        if !metadata.is_dir() {
            let relative = start.strip_prefix(&self.path)?.to_path_buf();
            return Ok(vec![relative]);
        }

        let mut files = WalkDir::new(&start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != REPOSITORY_DIR)
            .filter_map(|entry| entry.ok())
            .filter(|entry| !entry.file_type().is_dir())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.path)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    /// Direct children of a directory with their metadata, sorted by name.
    pub fn list_dir(&self, dir_path: &Path) -> anyhow::Result<Vec<(String, Metadata)>> {
        let full_path = self.path.join(dir_path);

        let mut children = std::fs::read_dir(&full_path)
            .with_context(|| format!("unable to list {}", full_path.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != REPOSITORY_DIR)
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let metadata = entry.path().metadata().ok()?;
                Some((name, metadata))
            })
            .collect::<Vec<_>>();
        children.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(children)
    }

    pub fn stat_file(&self, file_path: &Path) -> anyhow::Result<EntryMetadata> {
        let full_path = self.path.join(file_path);
        let metadata = std::fs::metadata(&full_path)
            .with_context(|| format!("unable to stat {}", file_path.display()))?;

        (full_path.as_path(), &metadata).try_into()
    }

    /// Stat data of a regular file, `None` when absent or a directory.
    pub fn stat_if_file(&self, file_path: &Path) -> anyhow::Result<Option<EntryMetadata>> {
        let full_path = self.path.join(file_path);

        match std::fs::metadata(&full_path) {
            Ok(metadata) if metadata.is_file() => {
                Ok(Some((full_path.as_path(), &metadata).try_into()?))
            }
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotADirectory => Ok(None),
            Err(err) => Err(err).with_context(|| format!("unable to stat {}", file_path.display())),
        }
    }

    /// Write a file, creating parent directories and replacing whatever
    /// occupies the path or its parents.
    pub fn write_file(&self, file_path: &Path, data: &[u8], mode: EntryMode) -> anyhow::Result<()> {
        let full_path = self.path.join(file_path);

        if let Some(parent) = file_path.parent() {
            self.make_directory(parent)?;
        }

        if let Ok(metadata) = std::fs::symlink_metadata(&full_path)
            && metadata.is_dir()
        {
            std::fs::remove_dir_all(&full_path)
                .with_context(|| format!("unable to replace directory {}", file_path.display()))?;
        }

        std::fs::write(&full_path, data)
            .with_context(|| format!("unable to write {}", file_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(mode.as_u32() & 0o777);
            std::fs::set_permissions(&full_path, permissions).with_context(|| {
                format!("unable to set permissions of {}", file_path.display())
            })?;
        }

        Ok(())
    }

    /// Whether a real directory (not a symlink to one) occupies the path.
    pub fn is_directory(&self, file_path: &Path) -> bool {
        std::fs::symlink_metadata(self.path.join(file_path)).is_ok_and(|metadata| metadata.is_dir())
    }

    /// Remove a file or symlink and then every parent directory left empty.
    /// A directory at the path is left alone.
    pub fn remove_file(&self, file_path: &Path) -> anyhow::Result<()> {
        let full_path = self.path.join(file_path);

        match std::fs::symlink_metadata(&full_path) {
            Ok(metadata) if metadata.is_dir() => {
                debug!(path = %file_path.display(), "directory in place of file, keeping it");
                return Ok(());
            }
            Ok(_) => std::fs::remove_file(&full_path)
                .with_context(|| format!("unable to remove {}", file_path.display()))?,
            Err(_) => {}
        }

        self.prune_empty_parents(file_path)
    }

    /// Like `remove_file`, but a directory at the path goes too. Only used
    /// by migrations, which have already checked for untracked content.
    fn remove_tracked_path(&self, file_path: &Path) -> anyhow::Result<()> {
        let full_path = self.path.join(file_path);

        if self.is_directory(file_path) {
            std::fs::remove_dir_all(&full_path)
                .with_context(|| format!("unable to remove directory {}", file_path.display()))?;
        }

        self.remove_file(file_path)
    }

    fn prune_empty_parents(&self, file_path: &Path) -> anyhow::Result<()> {
        for parent in file_path.ancestors().skip(1) {
            if parent.as_os_str().is_empty() {
                break;
            }

            let full_path = self.path.join(parent);
            let is_empty = std::fs::read_dir(&full_path)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !is_empty {
                break;
            }
            std::fs::remove_dir(&full_path)?;
        }

        Ok(())
    }

    /// Create `dir_path` and its parents, removing files that stand in the way.
    fn make_directory(&self, dir_path: &Path) -> anyhow::Result<()> {
        let mut current = PathBuf::new();

        for component in dir_path.components() {
            current.push(component);
            let full_path = self.path.join(&current);

            match std::fs::symlink_metadata(&full_path) {
                Ok(metadata) if metadata.is_dir() => continue,
                Ok(_) => std::fs::remove_file(&full_path)?,
                Err(_) => {}
            }
            std::fs::create_dir(&full_path)
                .with_context(|| format!("unable to create directory {}", current.display()))?;
        }

        Ok(())
    }

    /// Deletions first, then writes, so a file can replace a directory and
    /// the other way round.
    pub fn apply_migration(&self, migration: &Migration) -> anyhow::Result<()> {
        for file_path in migration.deletions() {
            debug!(path = %file_path.display(), "removing");
            self.remove_tracked_path(file_path)?;
        }

        for (file_path, entry) in migration.writes() {
            debug!(path = %file_path.display(), "writing");
            let blob = migration.load_blob(&entry.oid)?;
            self.write_file(file_path, blob.data(), entry.mode)?;
        }

        Ok(())
    }
}
