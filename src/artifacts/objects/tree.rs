//! Tree object
//!
//! A tree is one directory level: a sorted list of `(name, mode, oid)` entries
//! where the oid names either a blob (files) or another tree (directories).
//! Trees never embed other objects, only their ids.
//!
//! Content format, entry after entry: `<octal mode> <name>\0<20 raw id bytes>`

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::{Context, anyhow};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn new(entries: BTreeMap<String, DatabaseEntry>) -> Self {
        Tree { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: DatabaseEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }
}

impl Packable for Tree {
    fn content(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for (name, entry) in &self.entries {
            write!(content, "{:o} {}\0", entry.mode.as_u32(), name)?;
            entry.oid.write_h40_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();

        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            if reader.read_until(b' ', &mut mode_bytes)? == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow!("unexpected end of tree in mode"));
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(anyhow!("unexpected end of tree in name"));
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();
            if name.is_empty() || name.contains('/') {
                return Err(anyhow!("invalid tree entry name '{name}'"));
            }

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected end of tree in id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| {
                format!(
                    "{:0>6} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.object_type(),
                    entry.oid,
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::entry_mode::FileMode;
    use crate::artifacts::objects::object::hash_bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_tree_has_the_well_known_id() {
        assert_eq!(
            Tree::default().object_id().unwrap().as_ref(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
    }

    #[test]
    fn entries_decode_back() {
        let mut tree = Tree::default();
        tree.insert(
            "run.sh",
            DatabaseEntry::new(hash_bytes(b"a"), EntryMode::File(FileMode::Executable)),
        );
        tree.insert("src", DatabaseEntry::new(hash_bytes(b"b"), EntryMode::Directory));

        let content = tree.content().unwrap();
        let decoded = Tree::deserialize(content.as_ref()).unwrap();

        assert_eq!(decoded, tree);
    }

    #[test]
    fn truncated_entry_is_rejected() {
        let mut tree = Tree::default();
        tree.insert(
            "file",
            DatabaseEntry::new(hash_bytes(b"a"), EntryMode::File(FileMode::Regular)),
        );
        let content = tree.content().unwrap();

        assert!(Tree::deserialize(&content[..content.len() - 3]).is_err());
    }
}
