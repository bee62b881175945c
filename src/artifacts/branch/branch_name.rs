use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use crate::errors::VcsError;
use derive_new::new;
use std::sync::LazyLock;

pub const REF_PREFIX: &str = "refs/heads/";

static INVALID_BRANCH_NAME: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(INVALID_BRANCH_NAME_REGEX).unwrap_or_else(|_| unreachable!())
});

/// Path of a reference relative to the repository directory, e.g.
/// `refs/heads/main` or `HEAD`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, new)]
pub struct SymRefName(String);

impl SymRefName {
    /// Branch behind a `refs/heads/...` name.
    pub fn branch_name(&self) -> Option<BranchName> {
        self.0
            .strip_prefix(REF_PREFIX)
            .and_then(|name| BranchName::try_parse(name).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();

        if name.is_empty() || INVALID_BRANCH_NAME.is_match(&name) {
            return Err(VcsError::InvalidBranchName(name).into());
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
