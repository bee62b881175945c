//! Typed failures raised by the repository core
//!
//! Internal code propagates `anyhow::Error` and attaches context on the way up;
//! the root cause of every expected failure is one of these variants, so callers
//! can recover the kind with `err.downcast_ref::<VcsError>()`.

use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VcsError {
    #[error("object {0} not found")]
    ObjectNotFound(String),

    #[error("object {oid} is corrupt: {reason}")]
    ObjectCorrupt { oid: ObjectId, reason: String },

    #[error("object {oid} is a {actual}, not a {expected}")]
    UnexpectedObjectType {
        oid: ObjectId,
        expected: String,
        actual: String,
    },

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("short object id {prefix} is ambiguous ({} candidates)", .candidates.len())]
    AmbiguousId {
        prefix: String,
        candidates: Vec<ObjectId>,
    },

    #[error("index file {} is corrupt: {reason}", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("index file {} does not exist", .0.display())]
    IndexMissing(PathBuf),

    #[error("nothing to commit, tree {0} is unchanged")]
    NothingToCommit(ObjectId),

    #[error("pathspec '{0}' did not match any revision or branch")]
    TargetNotFound(String),

    #[error("local changes would be overwritten: {}", display_paths(.0))]
    UncommittedChanges(Vec<PathBuf>),

    #[error("unable to lock {}: another process holds the lock", .0.display())]
    LockContention(PathBuf),

    #[error("'{0}' is not a valid branch name")]
    InvalidBranchName(String),

    #[error("a branch named '{0}' already exists")]
    BranchExists(String),

    #[error("cannot delete branch '{0}' while it is checked out")]
    BranchCheckedOut(String),

    #[error("pathspec '{0}' did not match any files")]
    PathspecNotMatched(String),

    #[error("not a repository (or any of the parent directories): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("invalid config key '{0}', expected <section>.<name>")]
    InvalidConfigKey(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Return the typed error at the root of an `anyhow` chain, if any.
pub fn kind_of(err: &anyhow::Error) -> Option<&VcsError> {
    err.chain().find_map(|cause| cause.downcast_ref::<VcsError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn kind_is_found_below_context() {
        let err: anyhow::Result<()> = Err(VcsError::TargetNotFound("topic".into()).into());
        let err = err.context("checkout failed").unwrap_err();

        assert_eq!(
            kind_of(&err),
            Some(&VcsError::TargetNotFound("topic".into()))
        );
    }

    #[test]
    fn uncommitted_changes_lists_every_path() {
        let err = VcsError::UncommittedChanges(vec!["a.txt".into(), "dir/b.txt".into()]);

        assert_eq!(
            err.to_string(),
            "local changes would be overwritten: a.txt, dir/b.txt"
        );
    }
}
