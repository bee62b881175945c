//! Tree-shaped views compared by the diff engine
//!
//! Three views share one interface so every comparison runs through the same
//! walk: a stored tree, the index seen as a tree, and the working tree seen as
//! a tree. Each view lists one directory at a time, sorted by name.

use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::workspace::Workspace;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::index_entry::{EntryMetadata, IndexEntry};
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEntry<D> {
    File(DatabaseEntry),
    /// `oid` is known only for stored trees; equal ids let the walk skip the
    /// whole subtree
    Directory { oid: Option<ObjectId>, dir: D },
}

pub type Listing<D> = BTreeMap<String, SourceEntry<D>>;

pub trait TreeSource {
    /// Handle used to list a directory
    type Dir;

    /// `None` for an empty view, such as the tree of an unborn branch.
    fn root(&self) -> anyhow::Result<Option<Self::Dir>>;

    fn children(&self, dir: &Self::Dir) -> anyhow::Result<Listing<Self::Dir>>;
}

/// A tree in the object store, or nothing
#[derive(Debug)]
pub struct StoredTree<'d> {
    database: &'d Database,
    root: Option<ObjectId>,
}

impl<'d> StoredTree<'d> {
    pub fn new(database: &'d Database, root: Option<ObjectId>) -> Self {
        StoredTree { database, root }
    }

    /// Tree of `commit`, or the empty view when there is no commit.
    pub fn of_commit(database: &'d Database, commit: Option<&ObjectId>) -> anyhow::Result<Self> {
        let root = match commit {
            Some(commit) => Some(database.peel_to_tree(commit)?),
            None => None,
        };

        Ok(StoredTree { database, root })
    }

    /// Every file of the tree with its full path, sorted.
    pub fn files(&self) -> anyhow::Result<BTreeMap<PathBuf, DatabaseEntry>> {
        let mut files = BTreeMap::new();
        if let Some(root) = self.root()? {
            self.collect_files(&root, Path::new(""), &mut files)?;
        }

        Ok(files)
    }

    fn collect_files(
        &self,
        tree: &ObjectId,
        prefix: &Path,
        files: &mut BTreeMap<PathBuf, DatabaseEntry>,
    ) -> anyhow::Result<()> {
        for (name, entry) in self.children(tree)? {
            let path = prefix.join(name);
            match entry {
                SourceEntry::File(entry) => {
                    files.insert(path, entry);
                }
                SourceEntry::Directory { dir, .. } => self.collect_files(&dir, &path, files)?,
            }
        }

        Ok(())
    }
}

impl TreeSource for StoredTree<'_> {
    type Dir = ObjectId;

    fn root(&self) -> anyhow::Result<Option<ObjectId>> {
        Ok(self.root.clone())
    }

    fn children(&self, dir: &ObjectId) -> anyhow::Result<Listing<ObjectId>> {
        Ok(self
            .database
            .parse_tree(dir)?
            .into_entries()
            .map(|(name, entry)| {
                let source_entry = if entry.is_tree() {
                    SourceEntry::Directory {
                        oid: Some(entry.oid.clone()),
                        dir: entry.oid,
                    }
                } else {
                    SourceEntry::File(entry)
                };
                (name, source_entry)
            })
            .collect())
    }
}

/// The index as an ephemeral tree
#[derive(Debug)]
pub struct IndexTree<'i> {
    index: &'i Index,
}

impl<'i> IndexTree<'i> {
    pub fn new(index: &'i Index) -> Self {
        IndexTree { index }
    }
}

impl TreeSource for IndexTree<'_> {
    type Dir = PathBuf;

    fn root(&self) -> anyhow::Result<Option<PathBuf>> {
        Ok(Some(PathBuf::new()))
    }

    fn children(&self, dir: &PathBuf) -> anyhow::Result<Listing<PathBuf>> {
        let mut listing = Listing::new();

        for entry in self.index.entries_below(dir) {
            let relative = entry.name.strip_prefix(dir)?;
            let mut components = relative.components();
            let Some(first) = components.next() else {
                continue;
            };
            let name = first.as_os_str().to_string_lossy().into_owned();

            if components.next().is_none() {
                listing.insert(
                    name,
                    SourceEntry::File(DatabaseEntry::new(entry.oid.clone(), entry.mode())),
                );
            } else if !listing.contains_key(&name) {
                let subdir = dir.join(&name);
                listing.insert(name, SourceEntry::Directory { oid: None, dir: subdir });
            }
        }

        Ok(listing)
    }
}

/// The working tree as an ephemeral tree
///
/// File ids come from hashing content, except when the index holds an entry
/// whose stat data still matches the file and was recorded strictly before
/// the index itself was written; such entries are trusted as is.
#[derive(Debug)]
pub struct WorkspaceTree<'w> {
    workspace: &'w Workspace,
    index: Option<&'w Index>,
    index_mtime: Option<(i64, i64)>,
}

impl<'w> WorkspaceTree<'w> {
    pub fn new(workspace: &'w Workspace, index: Option<&'w Index>) -> Self {
        let index_mtime = index
            .and_then(|index| std::fs::metadata(index.path()).ok())
            .and_then(|metadata| metadata.modified().ok())
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|since| (since.as_secs() as i64, since.subsec_nanos() as i64));

        WorkspaceTree {
            workspace,
            index,
            index_mtime,
        }
    }

    /// Id of a working tree file as it would be staged.
    pub fn file_oid(&self, path: &Path, stat: &EntryMetadata) -> anyhow::Result<ObjectId> {
        if let Some(entry) = self.index.and_then(|index| index.entry_by_path(path))
            && self.can_trust(entry, stat)
        {
            return Ok(entry.oid.clone());
        }

        Blob::new(self.workspace.read_file(path)?).object_id()
    }

    fn can_trust(&self, entry: &IndexEntry, stat: &EntryMetadata) -> bool {
        let Some(index_mtime) = self.index_mtime else {
            return false;
        };

        entry.stat_match(stat)
            && entry.times_match(stat)
            && (entry.metadata.mtime, entry.metadata.mtime_nsec) < index_mtime
    }

    fn has_files(&self, dir: &Path) -> bool {
        walkdir::WalkDir::new(self.workspace.path().join(dir))
            .into_iter()
            .filter_map(|entry| entry.ok())
            .any(|entry| !entry.file_type().is_dir())
    }
}

impl TreeSource for WorkspaceTree<'_> {
    type Dir = PathBuf;

    fn root(&self) -> anyhow::Result<Option<PathBuf>> {
        Ok(Some(PathBuf::new()))
    }

    fn children(&self, dir: &PathBuf) -> anyhow::Result<Listing<PathBuf>> {
        let mut listing = Listing::new();

        for (name, metadata) in self.workspace.list_dir(dir)? {
            let path = dir.join(&name);

            if metadata.is_dir() {
                if self.has_files(&path) {
                    listing.insert(name, SourceEntry::Directory { oid: None, dir: path });
                }
                continue;
            }

            let full_path = self.workspace.path().join(&path);
            let stat = EntryMetadata::try_from((full_path.as_path(), &metadata))?;
            let oid = self.file_oid(&path, &stat)?;
            listing.insert(name, SourceEntry::File(DatabaseEntry::new(oid, stat.mode)));
        }

        Ok(listing)
    }
}
