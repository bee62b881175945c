//! References: `HEAD` and branches
//!
//! `HEAD` holds either `ref: refs/heads/<name>` (attached, possibly to a
//! branch that has no commit yet) or a bare commit id (detached). Branch files
//! under `refs/heads/` hold a commit id. Every write goes through a
//! `Lockfile`, so updates are atomic and serialized across processes.

use crate::artifacts::branch::branch_name::{BranchName, REF_PREFIX, SymRefName};
use crate::artifacts::core::lockfile::Lockfile;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::VcsError;
use anyhow::Context;
use derive_new::new;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;
use walkdir::WalkDir;

static SYMREF: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(SYMREF_REGEX).unwrap_or_else(|_| unreachable!()));

const SYMREF_REGEX: &str = r"^ref: (.+)$";

pub const HEAD_REF_NAME: &str = "HEAD";

#[derive(Debug, new)]
pub struct Refs {
    /// Repository directory (`.vcs`)
    path: Box<Path>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    SymRef { sym_ref_name: SymRefName },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("unable to read {}", path.display()));
            }
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        if let Some(symref_match) = SYMREF.captures(content) {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            }))
        } else {
            let oid = ObjectId::try_parse(content)
                .with_context(|| format!("malformed reference {}", path.display()))?;
            Ok(Some(SymRefOrOid::Oid(oid)))
        }
    }
}

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// On a branch; the branch may be unborn
    Attached(BranchName),
    Detached(ObjectId),
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    fn branch_path(&self, name: &BranchName) -> PathBuf {
        self.heads_path().join(name.as_ref())
    }

    pub fn head(&self) -> anyhow::Result<Head> {
        match SymRefOrOid::read_symref_or_oid(&self.head_path())? {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => sym_ref_name
                .branch_name()
                .map(Head::Attached)
                .with_context(|| format!("HEAD points outside refs/heads: {sym_ref_name:?}")),
            Some(SymRefOrOid::Oid(oid)) => Ok(Head::Detached(oid)),
            None => Err(anyhow::anyhow!("HEAD is missing or empty")),
        }
    }

    pub fn current_branch(&self) -> anyhow::Result<Option<BranchName>> {
        Ok(match self.head()? {
            Head::Attached(branch) => Some(branch),
            Head::Detached(_) => None,
        })
    }

    pub fn is_current_branch(&self, branch_name: &BranchName) -> anyhow::Result<bool> {
        Ok(self.current_branch()?.as_ref() == Some(branch_name))
    }

    /// Commit HEAD resolves to; `None` on an unborn branch.
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        match self.head()? {
            Head::Attached(branch) => self.read_branch(&branch),
            Head::Detached(oid) => Ok(Some(oid)),
        }
    }

    pub fn read_branch(&self, name: &BranchName) -> anyhow::Result<Option<ObjectId>> {
        match SymRefOrOid::read_symref_or_oid(&self.branch_path(name))? {
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            Some(SymRefOrOid::SymRef { .. }) | None => Ok(None),
        }
    }

    /// Move whatever HEAD resolves to.
    ///
    /// The target ref stays locked while `update` runs; it receives the
    /// current commit, re-read under the lock, and returns the new one.
    pub fn update_head_with<F>(&self, update: F) -> anyhow::Result<ObjectId>
    where
        F: FnOnce(Option<ObjectId>) -> anyhow::Result<ObjectId>,
    {
        let target = match self.head()? {
            Head::Attached(branch) => self.branch_path(&branch),
            Head::Detached(_) => self.head_path(),
        };

        let mut lock = Lockfile::acquire(&target)?;
        let current = match SymRefOrOid::read_symref_or_oid(&target)? {
            Some(SymRefOrOid::Oid(oid)) => Some(oid),
            _ => None,
        };

        let new_oid = update(current)?;
        writeln!(lock, "{new_oid}")?;
        lock.commit()?;

        info!(target = %target.display(), oid = %new_oid, "reference updated");
        Ok(new_oid)
    }

    /// Attach HEAD to a branch.
    pub fn set_head_to_branch(&self, branch: &BranchName) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &format!("ref: {REF_PREFIX}{branch}\n"))
    }

    /// Detach HEAD at a commit.
    pub fn set_head_to_oid(&self, oid: &ObjectId) -> anyhow::Result<()> {
        self.write_ref_file(&self.head_path(), &format!("{oid}\n"))
    }

    fn write_ref_file(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        let mut lock = Lockfile::acquire(path)?;
        lock.write_all(content.as_bytes())?;
        lock.commit()
    }

    pub fn create_branch(&self, name: &BranchName, source_oid: &ObjectId) -> anyhow::Result<()> {
        let branch_path = self.branch_path(name);

        let mut lock = Lockfile::acquire(&branch_path)?;
        if branch_path.exists() {
            return Err(VcsError::BranchExists(name.to_string()).into());
        }

        writeln!(lock, "{source_oid}")?;
        lock.commit()?;

        info!(branch = %name, oid = %source_oid, "branch created");
        Ok(())
    }

    /// Remove a branch and return the commit it pointed at.
    pub fn delete_branch(&self, name: &BranchName) -> anyhow::Result<ObjectId> {
        if self.is_current_branch(name)? {
            return Err(VcsError::BranchCheckedOut(name.to_string()).into());
        }

        let branch_path = self.branch_path(name);
        let lock = Lockfile::acquire(&branch_path)?;

        let oid = self
            .read_branch(name)?
            .ok_or_else(|| VcsError::TargetNotFound(name.to_string()))?;

        std::fs::remove_file(&branch_path)
            .with_context(|| format!("unable to delete branch file {}", branch_path.display()))?;
        lock.rollback();
        self.prune_branch_empty_parent_dirs(&branch_path)?;

        info!(branch = %name, oid = %oid, "branch deleted");
        Ok(oid)
    }

    /// Every branch, sorted by name.
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let heads_path = self.heads_path();

        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                BranchName::try_parse(relative_path.to_str()?).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> anyhow::Result<()> {
        let heads_path = self.heads_path();

        if let Some(parent) = path.parent()
            && parent != heads_path
            && parent.read_dir()?.next().is_none()
        {
            std::fs::remove_dir(parent).with_context(|| {
                format!("unable to remove empty branch directory {}", parent.display())
            })?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object::hash_bytes;
    use crate::errors::kind_of;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    fn refs(dir: &TempDir) -> Refs {
        dir.child("HEAD").write_str("ref: refs/heads/main\n").unwrap();
        Refs::new(dir.path().into())
    }

    fn branch(name: &str) -> BranchName {
        BranchName::try_parse(name).unwrap()
    }

    #[test]
    fn unborn_branch_has_no_commit() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);

        assert_eq!(refs.head().unwrap(), Head::Attached(branch("main")));
        assert_eq!(refs.read_head().unwrap(), None);
    }

    #[test]
    fn updating_head_moves_the_current_branch() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        let oid = hash_bytes(b"commit");

        refs.update_head_with(|_| Ok(oid.clone())).unwrap();

        dir.child("refs/heads/main").assert(format!("{oid}\n"));
        dir.child("HEAD").assert("ref: refs/heads/main\n");
        assert_eq!(refs.read_head().unwrap(), Some(oid));
    }

    #[test]
    fn detached_head_is_updated_in_place() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        let first = hash_bytes(b"first");
        let second = hash_bytes(b"second");

        refs.set_head_to_oid(&first).unwrap();
        refs.update_head_with(|current| {
            assert_eq!(current, Some(first.clone()));
            Ok(second.clone())
        })
        .unwrap();

        assert_eq!(refs.head().unwrap(), Head::Detached(second));
        dir.child("refs/heads/main").assert(predicates::path::missing());
    }

    #[test]
    fn branches_are_created_once() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        let oid = hash_bytes(b"commit");

        refs.create_branch(&branch("feature/x"), &oid).unwrap();
        let err = refs.create_branch(&branch("feature/x"), &oid).unwrap_err();

        assert_eq!(
            kind_of(&err),
            Some(&VcsError::BranchExists("feature/x".into()))
        );
        assert_eq!(refs.list_branches().unwrap(), vec![branch("feature/x")]);
    }

    #[test]
    fn deleting_prunes_empty_namespaces() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        let oid = hash_bytes(b"commit");
        refs.create_branch(&branch("feature/x"), &oid).unwrap();

        assert_eq!(refs.delete_branch(&branch("feature/x")).unwrap(), oid);

        dir.child("refs/heads/feature").assert(predicates::path::missing());
        dir.child("refs/heads").assert(predicates::path::is_dir());
    }

    #[test]
    fn missing_and_current_branches_cannot_be_deleted() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        refs.update_head_with(|_| Ok(hash_bytes(b"commit"))).unwrap();

        let missing = refs.delete_branch(&branch("nope")).unwrap_err();
        let current = refs.delete_branch(&branch("main")).unwrap_err();

        assert_eq!(kind_of(&missing), Some(&VcsError::TargetNotFound("nope".into())));
        assert_eq!(kind_of(&current), Some(&VcsError::BranchCheckedOut("main".into())));
    }

    #[test]
    fn held_branch_lock_is_contention() {
        let dir = TempDir::new().unwrap();
        let refs = refs(&dir);
        dir.child("refs/heads/main.lock").write_str("").unwrap();

        let err = refs.update_head_with(|_| Ok(hash_bytes(b"commit"))).unwrap_err();

        assert!(matches!(kind_of(&err), Some(VcsError::LockContention(_))));
        dir.child("refs/heads/main").assert(predicates::path::missing());
    }
}
