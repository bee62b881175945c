use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::tree_source::{Listing, SourceEntry, TreeSource};
use crate::artifacts::index::entry_mode::EntryMode;
use bitflags::bitflags;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::path::{Path, PathBuf};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
        const TYPE_CHANGED = 0b1000;
    }
}

impl DiffFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                'T' => filter |= Self::TYPE_CHANGED,
                _ => return None,
            }
        }

        Some(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Added(DatabaseEntry),
    Removed(DatabaseEntry),
    /// Same path, both files, different content or mode
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
    /// A file on one side, a directory on the other
    TypeChanged { old: EntryMode, new: EntryMode },
}

impl TreeChange {
    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self {
            TreeChange::Added(_) => filter.contains(DiffFilter::ADDED),
            TreeChange::Removed(_) => filter.contains(DiffFilter::DELETED),
            TreeChange::Modified { .. } => filter.contains(DiffFilter::MODIFIED),
            TreeChange::TypeChanged { .. } => filter.contains(DiffFilter::TYPE_CHANGED),
        }
    }

    pub fn old_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChange::Removed(entry) => Some(entry),
            TreeChange::Modified { old, .. } => Some(old),
            _ => None,
        }
    }

    pub fn new_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChange::Added(entry) => Some(entry),
            TreeChange::Modified { new, .. } => Some(new),
            _ => None,
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            TreeChange::Added(_) => 'A',
            TreeChange::Removed(_) => 'D',
            TreeChange::Modified { .. } => 'M',
            TreeChange::TypeChanged { .. } => 'T',
        }
    }

    /// The change seen from the other side.
    pub fn reversed(self) -> Self {
        match self {
            TreeChange::Added(entry) => TreeChange::Removed(entry),
            TreeChange::Removed(entry) => TreeChange::Added(entry),
            TreeChange::Modified { old, new } => TreeChange::Modified { old: new, new: old },
            TreeChange::TypeChanged { old, new } => TreeChange::TypeChanged { old: new, new: old },
        }
    }
}

/// Changes keyed by path, in path order
pub type ChangeSet = BTreeMap<PathBuf, TreeChange>;

pub fn reverse_changes(changes: ChangeSet) -> ChangeSet {
    changes
        .into_iter()
        .map(|(path, change)| (path, change.reversed()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Report a file/directory swap as the removal and additions of the
    /// leaves involved instead of a single `TypeChanged`
    pub expand_type_changes: bool,
}

impl DiffOptions {
    pub fn expanded() -> Self {
        DiffOptions {
            expand_type_changes: true,
        }
    }
}

/// Lock-step comparison of two tree views
///
/// Both sides list each directory sorted by name, so a single merge pass per
/// directory is enough. Directories whose ids are known and equal on both
/// sides are skipped without being listed.
#[derive(Debug)]
pub struct TreeDiff<'s, A, B> {
    old: &'s A,
    new: &'s B,
    options: DiffOptions,
    changes: ChangeSet,
}

impl<'s, A: TreeSource, B: TreeSource> TreeDiff<'s, A, B> {
    pub fn compare(old: &'s A, new: &'s B, options: DiffOptions) -> anyhow::Result<ChangeSet> {
        let mut diff = TreeDiff {
            old,
            new,
            options,
            changes: ChangeSet::new(),
        };

        let old_root = old.root()?;
        let new_root = new.root()?;
        diff.compare_dirs(old_root.as_ref(), new_root.as_ref(), Path::new(""))?;

        Ok(diff.changes)
    }

    fn compare_dirs(
        &mut self,
        old_dir: Option<&A::Dir>,
        new_dir: Option<&B::Dir>,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        let old_listing = match old_dir {
            Some(dir) => self.old.children(dir)?,
            None => Listing::new(),
        };
        let new_listing = match new_dir {
            Some(dir) => self.new.children(dir)?,
            None => Listing::new(),
        };

        let mut old_entries = old_listing.into_iter().peekable();
        let mut new_entries = new_listing.into_iter().peekable();

        while let Some((name, old_entry, new_entry)) = next_pair(&mut old_entries, &mut new_entries) {
            let path = prefix.join(&name);
            self.compare_entries(old_entry, new_entry, path)?;
        }

        Ok(())
    }

    fn compare_entries(
        &mut self,
        old_entry: Option<SourceEntry<A::Dir>>,
        new_entry: Option<SourceEntry<B::Dir>>,
        path: PathBuf,
    ) -> anyhow::Result<()> {
        use SourceEntry::{Directory, File};

        match (old_entry, new_entry) {
            (Some(File(old)), Some(File(new))) => {
                if old != new {
                    self.changes.insert(path, TreeChange::Modified { old, new });
                }
            }
            (Some(File(old)), None) => {
                self.changes.insert(path, TreeChange::Removed(old));
            }
            (None, Some(File(new))) => {
                self.changes.insert(path, TreeChange::Added(new));
            }
            (Some(Directory { oid: old_oid, dir: old_dir }), Some(Directory { oid: new_oid, dir: new_dir })) => {
                if old_oid.is_some() && old_oid == new_oid {
                    return Ok(());
                }
                self.compare_dirs(Some(&old_dir), Some(&new_dir), &path)?;
            }
            (Some(Directory { dir, .. }), None) => {
                self.compare_dirs(Some(&dir), None, &path)?;
            }
            (None, Some(Directory { dir, .. })) => {
                self.compare_dirs(None, Some(&dir), &path)?;
            }
            (Some(File(old)), Some(Directory { dir, .. })) => {
                if self.options.expand_type_changes {
                    self.compare_dirs(None, Some(&dir), &path)?;
                    self.changes.insert(path, TreeChange::Removed(old));
                } else {
                    self.changes.insert(
                        path,
                        TreeChange::TypeChanged {
                            old: old.mode,
                            new: EntryMode::Directory,
                        },
                    );
                }
            }
            (Some(Directory { dir, .. }), Some(File(new))) => {
                if self.options.expand_type_changes {
                    self.compare_dirs(Some(&dir), None, &path)?;
                    self.changes.insert(path, TreeChange::Added(new));
                } else {
                    self.changes.insert(
                        path,
                        TreeChange::TypeChanged {
                            old: EntryMode::Directory,
                            new: new.mode,
                        },
                    );
                }
            }
            (None, None) => {}
        }

        Ok(())
    }
}

type Entries<D> = Peekable<std::collections::btree_map::IntoIter<String, SourceEntry<D>>>;

/// Pop the smallest name from either side, pairing it with its counterpart
/// when both sides have it.
fn next_pair<X, Y>(
    old: &mut Entries<X>,
    new: &mut Entries<Y>,
) -> Option<(String, Option<SourceEntry<X>>, Option<SourceEntry<Y>>)> {
    let take_old = match (old.peek(), new.peek()) {
        (None, None) => return None,
        (Some(_), None) => Some(true),
        (None, Some(_)) => Some(false),
        (Some((old_name, _)), Some((new_name, _))) => match old_name.cmp(new_name) {
            std::cmp::Ordering::Less => Some(true),
            std::cmp::Ordering::Greater => Some(false),
            std::cmp::Ordering::Equal => None,
        },
    };

    match take_old {
        Some(true) => old.next().map(|(name, entry)| (name, Some(entry), None)),
        Some(false) => new.next().map(|(name, entry)| (name, None, Some(entry))),
        None => {
            let (name, old_entry) = old.next()?;
            let (_, new_entry) = new.next()?;
            Some((name, Some(old_entry), Some(new_entry)))
        }
    }
}
