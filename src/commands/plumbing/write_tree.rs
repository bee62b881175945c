use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::tree_builder::TreeBuilder;
use std::io::Write;

impl Repository {
    /// Store the tree of the current index and print its id.
    pub async fn write_tree(&mut self) -> anyhow::Result<ObjectId> {
        let index = self.index();
        let mut index = index.lock().await;
        index.load()?;

        let tree_oid = self.store_index_tree(&index)?;
        writeln!(self.writer(), "{tree_oid}")?;

        Ok(tree_oid)
    }

    /// Subtrees are stored before their parents; returns the root id.
    pub(crate) fn store_index_tree(&self, index: &Index) -> anyhow::Result<ObjectId> {
        let builder = TreeBuilder::build(index.entries())?;

        builder.write(&mut |tree: &Tree| self.database().store(tree))
    }
}
