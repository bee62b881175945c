//! Exclusive lock files
//!
//! A writer that wants to replace `path` first creates `path.lock` with
//! `create_new`, which fails if another writer already holds it. New content is
//! written into the lock file and renamed over the target on commit, so readers
//! only ever see the old or the new version. A lock that is dropped without
//! being committed removes its file.

use crate::errors::VcsError;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const LOCK_ATTEMPTS: u32 = 12;
const BASE_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct Lockfile {
    target: PathBuf,
    lock_path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl Lockfile {
    /// Acquire the lock for `target`, retrying with exponential backoff and
    /// jitter before failing with `LockContention`.
    pub fn acquire(target: &Path) -> anyhow::Result<Self> {
        let mut backoff = BASE_BACKOFF;

        for attempt in 1..=LOCK_ATTEMPTS {
            if let Some(lock) = Self::try_acquire(target)? {
                return Ok(lock);
            }

            let jitter = fake::rand::random::<u64>() % (backoff.as_millis() as u64 + 1);
            debug!(
                target = %target.display(),
                attempt,
                "lock is held, retrying"
            );
            std::thread::sleep(backoff + Duration::from_millis(jitter));
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }

        warn!(target = %target.display(), "giving up on contended lock");
        Err(VcsError::LockContention(lock_path_for(target)).into())
    }

    /// Single attempt; `None` when another writer holds the lock.
    pub fn try_acquire(target: &Path) -> anyhow::Result<Option<Self>> {
        let lock_path = lock_path_for(target);

        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => Ok(Some(Lockfile {
                target: target.to_path_buf(),
                lock_path,
                file: Some(file),
                committed: false,
            })),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("unable to create lock file {}", lock_path.display())),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Flush the staged content and atomically replace the target. On
    /// failure the lock file is still removed when `self` drops.
    pub fn commit(mut self) -> anyhow::Result<()> {
        let file = self.file.as_mut().context("lock file already released")?;
        file.flush()?;
        file.sync_all()?;
        self.file = None;

        std::fs::rename(&self.lock_path, &self.target).with_context(|| {
            format!(
                "unable to rename {} to {}",
                self.lock_path.display(),
                self.target.display()
            )
        })?;
        self.committed = true;

        debug!(target = %self.target.display(), "lock committed");
        Ok(())
    }

    /// Release the lock without touching the target.
    pub fn rollback(self) {
        drop(self)
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("lock file already released"))
    }
}

impl Write for Lockfile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}

impl Drop for Lockfile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::kind_of;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    #[test]
    fn commit_replaces_the_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.child("HEAD");
        target.write_str("old\n").unwrap();

        let mut lock = Lockfile::acquire(target.path()).unwrap();
        lock.write_all(b"new\n").unwrap();
        lock.commit().unwrap();

        target.assert("new\n");
        dir.child("HEAD.lock").assert(predicates::path::missing());
    }

    #[test]
    fn dropping_a_lock_leaves_the_target_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.child("index");
        target.write_str("old").unwrap();

        {
            let mut lock = Lockfile::acquire(target.path()).unwrap();
            lock.write_all(b"partial").unwrap();
        }

        target.assert("old");
        dir.child("index.lock").assert(predicates::path::missing());
    }

    #[test]
    fn failed_commit_releases_the_lock() {
        let dir = TempDir::new().unwrap();
        let target = dir.child("target");
        target.child("occupied").write_str("x").unwrap();

        let mut lock = Lockfile::acquire(target.path()).unwrap();
        lock.write_all(b"new").unwrap();

        assert!(lock.commit().is_err());
        dir.child("target.lock").assert(predicates::path::missing());

        std::fs::remove_dir_all(target.path()).unwrap();
        assert!(Lockfile::try_acquire(target.path()).unwrap().is_some());
    }

    #[test]
    fn a_held_lock_blocks_other_writers() {
        let dir = TempDir::new().unwrap();
        let target = dir.child("index");

        let _held = Lockfile::acquire(target.path()).unwrap();

        assert!(Lockfile::try_acquire(target.path()).unwrap().is_none());
        let err = Lockfile::acquire(target.path()).unwrap_err();
        assert!(matches!(kind_of(&err), Some(VcsError::LockContention(_))));
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new(".vcs/refs/heads/feature/x")),
            PathBuf::from(".vcs/refs/heads/feature/x.lock")
        );
    }
}
