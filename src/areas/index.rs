//! Staging area
//!
//! The index is an ordered table of the paths that make up the next commit.
//! It is read in full at load time and rewritten in full on save, through the
//! `index.lock` lockfile so readers never observe a half written index.
//!
//! `children` maps every directory that has tracked files below it to those
//! files, which keeps file/directory replacement and directory queries cheap.

use crate::areas::database::Database;
use crate::artifacts::core::lockfile::Lockfile;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{
    ENTRY_BLOCK, ENTRY_MIN_SIZE, EntryMetadata, IndexEntry,
};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::HEADER_SIZE;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::VcsError;
use anyhow::Context;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct Index {
    path: Box<Path>,
    entries: BTreeMap<Box<Path>, IndexEntry>,
    children: BTreeMap<Box<Path>, BTreeSet<Box<Path>>>,
    changed: bool,
    lock: Option<Lockfile>,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            changed: false,
            lock: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.changed = false;
    }

    /// Read the index from disk. A missing file is an empty index.
    pub fn load(&mut self) -> anyhow::Result<()> {
        self.clear();

        match self.read_from_disk() {
            Ok(()) => Ok(()),
            Err(err) if matches!(err.downcast_ref::<VcsError>(), Some(VcsError::IndexMissing(_))) => {
                debug!(path = %self.path.display(), "no index yet");
                Ok(())
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Take the index lock, then load. The lock is held until
    /// `write_updates` or `release_lock`.
    pub fn load_for_update(&mut self) -> anyhow::Result<()> {
        if self.lock.is_none() {
            self.lock = Some(Lockfile::acquire(&self.path)?);
        }

        self.load()
    }

    pub fn release_lock(&mut self) {
        if let Some(lock) = self.lock.take() {
            lock.rollback();
        }
    }

    fn read_from_disk(&mut self) -> anyhow::Result<()> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(VcsError::IndexMissing(self.path.to_path_buf()).into());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("unable to open index {}", self.path.display()));
            }
        };

        let mut reader = Checksum::new(BufReader::new(file));
        self.parse(&mut reader).map_err(|err| {
            VcsError::IndexCorrupt {
                path: self.path.to_path_buf(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    fn parse(&mut self, reader: &mut Checksum<BufReader<std::fs::File>>) -> anyhow::Result<()> {
        let header = IndexHeader::deserialize(&reader.read(HEADER_SIZE)?)?;

        let mut previous: Option<PathBuf> = None;
        for _ in 0..header.entries_count {
            let mut entry_bytes = reader.read(ENTRY_MIN_SIZE)?.to_vec();

            while entry_bytes[entry_bytes.len() - 1] != 0 {
                entry_bytes.extend_from_slice(&reader.read(ENTRY_BLOCK)?);
            }

            let entry = IndexEntry::deserialize(&entry_bytes)?;
            if let Some(previous) = &previous
                && previous >= &entry.name
            {
                anyhow::bail!("entries are not sorted at {}", entry.name.display());
            }
            previous = Some(entry.name.clone());

            self.store_entry(entry);
        }

        reader.verify()
    }

    /// Write the index through the held lock and release it.
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let lock = self
            .lock
            .take()
            .context("index must be loaded for update before it is written")?;

        if !self.changed {
            lock.rollback();
            return Ok(());
        }

        let mut writer = Checksum::new(lock);
        writer.write(&IndexHeader::with_count(self.entries.len() as u32).serialize()?)?;
        for entry in self.entries.values() {
            writer.write(&entry.serialize()?)?;
        }
        writer.write_checksum()?;
        writer.into_inner().commit()?;

        debug!(entries = self.entries.len(), "index written");
        self.changed = false;

        Ok(())
    }

    /// Store the content as a blob, then record it under `path`.
    pub fn stage(
        &mut self,
        database: &Database,
        path: &Path,
        content: Bytes,
        stat: EntryMetadata,
    ) -> anyhow::Result<ObjectId> {
        let oid = database.store(&Blob::new(content))?;
        self.add(IndexEntry::new(path.to_path_buf(), oid.clone(), stat));

        Ok(oid)
    }

    /// Drop the entry for `path`, or every entry below it for a directory.
    pub fn unstage(&mut self, path: &Path) {
        self.remove(path);
    }

    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    pub fn remove(&mut self, path: &Path) {
        let had_entry = self.remove_entry(path);
        let had_children = self.remove_children(path);

        self.changed |= had_entry || had_children;
    }

    /// Replace the whole table.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = IndexEntry>) {
        self.entries.clear();
        self.children.clear();
        for entry in entries {
            self.store_entry(entry);
        }
        self.changed = true;
    }

    /// A file becoming tracked at `a/b` evicts a file entry `a`; a file at
    /// `a` evicts everything under `a/`.
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.into())
                .or_default()
                .insert(entry.name.clone().into_boxed_path());
        }

        self.entries
            .insert(entry.name.clone().into_boxed_path(), entry);
    }

    fn remove_children(&mut self, path: &Path) -> bool {
        match self.children.remove(path) {
            Some(children) => {
                for child in children {
                    self.remove_entry(&child);
                }
                true
            }
            None => false,
        }
    }

    fn remove_entry(&mut self, path: &Path) -> bool {
        let Some(entry) = self.entries.remove(path) else {
            return false;
        };

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        true
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn is_tracked_file(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn is_tracked_directory(&self, path: &Path) -> bool {
        self.children.contains_key(path)
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || self.is_tracked_file(path) || self.is_tracked_directory(path)
    }

    /// Entries sorted by path.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Entries strictly below directory `dir`, sorted. The empty path
    /// selects everything.
    pub fn entries_below<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries
            .range::<Path, _>((std::ops::Bound::Included(dir), std::ops::Bound::Unbounded))
            .take_while(move |(path, _)| path.starts_with(dir))
            .filter(move |(path, _)| &***path != dir)
            .map(|(_, entry)| entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths of the entry at `path` and of every entry below it. The empty
    /// path selects everything.
    pub fn entries_under(&self, path: &Path) -> Vec<PathBuf> {
        if path.as_os_str().is_empty() {
            return self.entries.keys().map(|key| key.to_path_buf()).collect();
        }

        let mut paths = self
            .children
            .get(path)
            .map(|children| children.iter().map(|child| child.to_path_buf()).collect())
            .unwrap_or_else(Vec::new);
        if self.is_tracked_file(path) {
            paths.push(path.to_path_buf());
        }
        paths.sort();

        paths
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

    fn entry(path: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(path),
            hash_bytes(path.as_bytes()),
            EntryMetadata::default(),
        )
    }

    fn names(index: &Index) -> Vec<String> {
        index
            .entries()
            .map(|entry| entry.name.display().to_string())
            .collect()
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut index = Index::new(dir.path().join("index").into_boxed_path());

        index.load().unwrap();

        assert!(index.is_empty());
    }

    #[test]
    fn entries_survive_a_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index").into_boxed_path();

        let mut index = Index::new(path.clone());
        index.load_for_update().unwrap();
        index.add(entry("b.txt"));
        index.add(entry("a/nested.txt"));
        index.write_updates().unwrap();

        let mut reloaded = Index::new(path);
        reloaded.load().unwrap();
        assert_eq!(names(&reloaded), vec!["a/nested.txt", "b.txt"]);
        dir.child("index.lock").assert(predicates::path::missing());
    }

    #[test]
    fn directory_replaces_file_and_back() {
        let mut index = Index::new(PathBuf::from("index").into_boxed_path());

        index.add(entry("alice.txt"));
        index.add(entry("nested"));
        index.add(entry("nested/inner/file.txt"));
        assert_eq!(names(&index), vec!["alice.txt", "nested/inner/file.txt"]);

        index.add(entry("nested"));
        assert_eq!(names(&index), vec!["alice.txt", "nested"]);
        assert!(!index.is_tracked_directory(Path::new("nested/inner")));
    }

    #[test]
    fn unstaging_a_directory_drops_its_files() {
        let mut index = Index::new(PathBuf::from("index").into_boxed_path());
        index.add(entry("dir/a"));
        index.add(entry("dir/sub/b"));
        index.add(entry("other"));

        assert_eq!(
            index.entries_under(Path::new("dir")),
            vec![PathBuf::from("dir/a"), PathBuf::from("dir/sub/b")]
        );
        index.unstage(Path::new("dir"));

        assert_eq!(names(&index), vec!["other"]);
    }

    #[test]
    fn bad_checksum_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index").into_boxed_path();
        let mut index = Index::new(path.clone());
        index.load_for_update().unwrap();
        index.add(entry("file"));
        index.write_updates().unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        let err = Index::new(path).load().unwrap_err();
        assert!(matches!(
            kind_of(&err),
            Some(VcsError::IndexCorrupt { reason, .. }) if reason == "checksum mismatch"
        ));
    }

    #[test]
    fn wrong_signature_is_corrupt() {
        let dir = TempDir::new().unwrap();
        dir.child("index").write_binary(b"JUNK\0\0\0\x02\0\0\0\0").unwrap();

        let err = Index::new(dir.path().join("index").into_boxed_path())
            .load()
            .unwrap_err();

        assert!(matches!(
            kind_of(&err),
            Some(VcsError::IndexCorrupt { reason, .. }) if reason == "bad signature"
        ));
    }

    #[test]
    fn truncated_entry_is_corrupt() {
        let dir = TempDir::new().unwrap();
        dir.child("index").write_binary(b"DIRC\0\0\0\x02\0\0\0\x01short").unwrap();

        let err = Index::new(dir.path().join("index").into_boxed_path())
            .load()
            .unwrap_err();

        assert!(matches!(kind_of(&err), Some(VcsError::IndexCorrupt { .. })));
    }

    #[test]
    fn second_writer_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index").into_boxed_path();

        let mut first = Index::new(path.clone());
        first.load_for_update().unwrap();

        let mut second = Index::new(path);
        let err = second.load_for_update().unwrap_err();
        assert!(matches!(kind_of(&err), Some(VcsError::LockContention(_))));

        first.release_lock();
        assert!(second.load_for_update().is_ok());
    }
}
