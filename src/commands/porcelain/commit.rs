use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::commands::plumbing::write_commit::normalize_message;
use crate::errors::VcsError;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// `Name <email>` overriding the configured author
    pub author: Option<String>,
    pub allow_empty: bool,
}

impl Repository {
    /// Record the index as a new commit on top of HEAD.
    ///
    /// The parent is read while the ref is locked, so two concurrent commits
    /// both land, one on top of the other.
    pub async fn commit(&mut self, message: &str, options: &CommitOptions) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        let tree_oid = self.store_index_tree(&index)?;
        let index_is_empty = index.is_empty();
        drop(index);

        let committer = self.author()?;
        let author = match &options.author {
            Some(identity) => Author::parse_identity(identity)?.at(committer.timestamp()),
            None => committer.clone(),
        };
        let message = normalize_message(message);

        let mut is_root = false;
        let commit_oid = self.refs().update_head_with(|parent| {
            if !options.allow_empty {
                let unchanged = match &parent {
                    Some(parent) => self.database().parse_commit(parent)?.tree_oid() == &tree_oid,
                    None => index_is_empty,
                };
                if unchanged {
                    return Err(VcsError::NothingToCommit(tree_oid.clone()).into());
                }
            }

            is_root = parent.is_none();
            let commit = Commit::new(
                parent.into_iter().collect(),
                tree_oid.clone(),
                author,
                message.clone(),
            )
            .with_committer(committer);

            self.database().store(&commit)
        })?;

        let location = match self.refs().head()? {
            Head::Attached(branch) => branch.to_string(),
            Head::Detached(_) => "detached HEAD".to_string(),
        };
        let root_marker = if is_root { " (root-commit)" } else { "" };
        writeln!(
            self.writer(),
            "[{location}{root_marker} {}] {}",
            commit_oid.to_short_oid(),
            message.lines().next().unwrap_or_default()
        )?;

        Ok(commit_oid)
    }
}
