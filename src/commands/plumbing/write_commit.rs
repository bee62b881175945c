use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::io::Write;

impl Repository {
    /// Store a commit for an existing tree. Neither refs nor the index are
    /// touched.
    pub async fn write_commit(
        &mut self,
        tree: &str,
        parents: &[String],
        message: &str,
        author: Option<Author>,
    ) -> anyhow::Result<ObjectId> {
        let tree_oid = self.resolve_object(tree)?;
        self.database()
            .object_type(&tree_oid)?
            .expect(ObjectType::Tree, &tree_oid)?;

        let parents = parents
            .iter()
            .map(|parent| self.resolve_commit(parent))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let author = match author {
            Some(author) => author,
            None => self.author()?,
        };
        let commit = Commit::new(parents, tree_oid, author, normalize_message(message));
        let commit_oid = self.database().store(&commit)?;

        writeln!(self.writer(), "{commit_oid}")?;

        Ok(commit_oid)
    }
}

/// Surrounding whitespace trimmed, one trailing newline.
pub fn normalize_message(message: &str) -> String {
    format!("{}\n", message.trim())
}
