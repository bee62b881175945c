//! Flat index to tree graph
//!
//! The index is a flat sorted list of paths. Building a snapshot groups those
//! paths by directory, one `Tree` per directory level, and stores every subtree
//! before its parent so that each parent can reference the child's id.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use anyhow::anyhow;
use std::collections::BTreeMap;
use std::path::Component;

#[derive(Debug, Clone)]
enum Node {
    File(DatabaseEntry),
    Directory(TreeBuilder),
}

#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    nodes: BTreeMap<String, Node>,
}

impl TreeBuilder {
    /// Arrange index entries into nested directories. Input order is irrelevant.
    pub fn build<'e>(entries: impl IntoIterator<Item = &'e IndexEntry>) -> anyhow::Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            let components = entry
                .name
                .components()
                .map(|component| match component {
                    Component::Normal(name) => name
                        .to_str()
                        .ok_or_else(|| anyhow!("invalid path {}", entry.name.display())),
                    _ => Err(anyhow!("path {} is not relative", entry.name.display())),
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            root.add_entry(&components, entry)?;
        }

        Ok(root)
    }

    fn add_entry(&mut self, components: &[&str], entry: &IndexEntry) -> anyhow::Result<()> {
        match components {
            [] => Err(anyhow!("empty path in index")),
            [name] => {
                if let Some(Node::Directory(_)) = self.nodes.get(*name) {
                    return Err(anyhow!("{} is both a file and a directory", entry.name.display()));
                }
                self.nodes.insert(
                    name.to_string(),
                    Node::File(DatabaseEntry::new(entry.oid.clone(), entry.mode())),
                );
                Ok(())
            }
            [dir, rest @ ..] => {
                let node = self
                    .nodes
                    .entry(dir.to_string())
                    .or_insert_with(|| Node::Directory(TreeBuilder::default()));

                match node {
                    Node::Directory(subtree) => subtree.add_entry(rest, entry),
                    Node::File(_) => Err(anyhow!(
                        "{} is both a file and a directory",
                        entry.name.display()
                    )),
                }
            }
        }
    }

    /// Hand every tree to `store`, children before parents, and return the
    /// root tree id.
    pub fn write<F>(&self, store: &mut F) -> anyhow::Result<ObjectId>
    where
        F: FnMut(&Tree) -> anyhow::Result<ObjectId>,
    {
        let mut tree = Tree::default();

        for (name, node) in &self.nodes {
            let entry = match node {
                Node::File(entry) => entry.clone(),
                Node::Directory(subtree) => {
                    DatabaseEntry::new(subtree.write(store)?, EntryMode::Directory)
                }
            };
            tree.insert(name.clone(), entry);
        }

        store(&tree)
    }

    /// Root id of the snapshot without storing anything.
    pub fn object_id(&self) -> anyhow::Result<ObjectId> {
        self.write(&mut |tree: &Tree| tree.object_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::objects::object::hash_bytes;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn entry(path: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(path),
            hash_bytes(path.as_bytes()),
            EntryMetadata::default(),
        )
    }

    #[test]
    fn subtrees_are_stored_before_parents() {
        let entries = vec![entry("a/b/c.txt"), entry("a/d.txt"), entry("e.txt")];
        let builder = TreeBuilder::build(&entries).unwrap();

        let mut stored = Vec::new();
        let root = builder
            .write(&mut |tree: &Tree| {
                stored.push(tree.clone());
                tree.object_id()
            })
            .unwrap();

        let names = stored
            .iter()
            .map(|tree| tree.entries().map(|(name, _)| name.clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                vec!["c.txt".to_string()],
                vec!["b".to_string(), "d.txt".to_string()],
                vec!["a".to_string(), "e.txt".to_string()],
            ]
        );
        assert_eq!(stored.last().unwrap().object_id().unwrap(), root);
    }

    #[test]
    fn empty_index_builds_the_empty_tree() {
        let builder = TreeBuilder::build(&Vec::new()).unwrap();

        assert_eq!(
            builder.object_id().unwrap().as_ref(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }

    #[test]
    fn file_directory_collision_is_rejected() {
        let entries = vec![entry("a"), entry("a/b")];

        assert!(TreeBuilder::build(&entries).is_err());
    }

    proptest! {
        #[test]
        fn root_id_ignores_input_order(
            paths in prop::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,2}\\.txt", 1..12),
            seed in any::<u64>(),
        ) {
            let entries = paths.iter().map(|path| entry(path)).collect::<Vec<_>>();
            let mut shuffled = entries.clone();
            let len = shuffled.len();
            for i in 0..len {
                let j = ((seed >> (i % 32)) as usize + i * 7) % len;
                shuffled.swap(i, j);
            }

            let sorted_root = TreeBuilder::build(&entries).unwrap().object_id().unwrap();
            let shuffled_root = TreeBuilder::build(&shuffled).unwrap().object_id().unwrap();
            prop_assert_eq!(sorted_root, shuffled_root);
        }
    }
}
