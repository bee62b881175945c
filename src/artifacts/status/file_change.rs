use crate::artifacts::diff::tree_diff::TreeChange;

/// Change between HEAD and the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IndexChangeType {
    #[default]
    None,
    Added,
    Modified,
    Deleted,
}

impl From<&TreeChange> for IndexChangeType {
    fn from(change: &TreeChange) -> Self {
        match change {
            TreeChange::Added(_) => IndexChangeType::Added,
            TreeChange::Removed(_) => IndexChangeType::Deleted,
            TreeChange::Modified { .. } | TreeChange::TypeChanged { .. } => {
                IndexChangeType::Modified
            }
        }
    }
}

impl IndexChangeType {
    fn as_char(self) -> char {
        match self {
            IndexChangeType::None => ' ',
            IndexChangeType::Added => 'A',
            IndexChangeType::Modified => 'M',
            IndexChangeType::Deleted => 'D',
        }
    }
}

/// Change between the index and the working tree. Files missing from the
/// index are untracked and kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WorkspaceChangeType {
    #[default]
    None,
    Modified,
    Deleted,
}

impl WorkspaceChangeType {
    fn as_char(self) -> char {
        match self {
            WorkspaceChangeType::None => ' ',
            WorkspaceChangeType::Modified => 'M',
            WorkspaceChangeType::Deleted => 'D',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FileChange {
    pub index_change: IndexChangeType,
    pub workspace_change: WorkspaceChangeType,
}

/// Two column short form, index first: `M `, ` D`, `AM`.
impl std::fmt::Display for FileChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            self.index_change.as_char(),
            self.workspace_change.as_char()
        )
    }
}
