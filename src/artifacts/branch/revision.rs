//! Revision expressions
//!
//! Accepted forms:
//! - branch names: `main`, `feature/x`
//! - `HEAD` and its alias `@`
//! - full or abbreviated (at least 4 hex characters) object ids
//! - `<rev>^` for the first parent and `<rev>~<n>` for the n-th first-parent
//!   ancestor
//!
//! A name that is both a branch and a valid id prefix resolves to the branch.

use crate::areas::database::Database;
use crate::areas::refs::{HEAD_REF_NAME, Refs};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::{MIN_PREFIX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{VcsError, kind_of};
use std::sync::LazyLock;

static PARENT: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(PARENT_REGEX).unwrap_or_else(|_| unreachable!()));
static ANCESTOR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(ANCESTOR_REGEX).unwrap_or_else(|_| unreachable!()));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// Branch, `HEAD` or object id; told apart during resolution
    Ref(String),
    /// The n-th first-parent ancestor
    Ancestor(Box<Revision>, usize),
    /// The first parent
    Parent(Box<Revision>),
}

impl Revision {
    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        if let Some(caps) = PARENT.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Parent(Box::new(base_revision)));
        }

        if let Some(caps) = ANCESTOR.captures(revision) {
            let generations = caps[2]
                .parse::<usize>()
                .map_err(|_| VcsError::TargetNotFound(revision.to_string()))?;
            let base_revision = Self::try_parse(&caps[1])?;
            return Ok(Revision::Ancestor(Box::new(base_revision), generations));
        }

        let name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        if name != HEAD_REF_NAME && !looks_like_oid(name) {
            BranchName::try_parse(name)?;
        }

        Ok(Revision::Ref(name.to_string()))
    }

    /// Parse and resolve an expression to a commit id.
    ///
    /// Anything that does not name a commit fails with `TargetNotFound`,
    /// except ambiguous prefixes (`AmbiguousId`) and ids of other object kinds
    /// (`UnexpectedObjectType`).
    pub fn resolve_commit(
        expression: &str,
        refs: &Refs,
        database: &Database,
    ) -> anyhow::Result<ObjectId> {
        let not_found = || VcsError::TargetNotFound(expression.to_string());

        let revision = Self::try_parse(expression).map_err(|_| not_found())?;
        let oid = revision.resolve(refs, database)?.ok_or_else(not_found)?;
        database.object_type(&oid)?.expect(ObjectType::Commit, &oid)?;

        Ok(oid)
    }

    /// `None` when a ref is missing or history runs out.
    pub fn resolve(&self, refs: &Refs, database: &Database) -> anyhow::Result<Option<ObjectId>> {
        match self {
            Revision::Ref(name) if name == HEAD_REF_NAME => refs.read_head(),
            Revision::Ref(name) => {
                if let Ok(branch) = BranchName::try_parse(name.as_str())
                    && let Some(oid) = refs.read_branch(&branch)?
                {
                    return Ok(Some(oid));
                }

                if !looks_like_oid(name) {
                    return Ok(None);
                }

                match database.resolve_prefix(name) {
                    Ok(oid) => Ok(Some(oid)),
                    Err(err) if matches!(kind_of(&err), Some(VcsError::ObjectNotFound(_))) => {
                        Ok(None)
                    }
                    Err(err) => Err(err),
                }
            }
            Revision::Parent(base_revision) => {
                Self::commit_parent(base_revision.resolve(refs, database)?, database)
            }
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(refs, database)?;
                for _ in 0..*generations {
                    oid = Self::commit_parent(oid, database)?;
                }

                Ok(oid)
            }
        }
    }

    fn commit_parent(
        oid: Option<ObjectId>,
        database: &Database,
    ) -> anyhow::Result<Option<ObjectId>> {
        match oid {
            Some(oid) => Ok(database.parse_commit(&oid)?.parent().cloned()),
            None => Ok(None),
        }
    }
}

fn looks_like_oid(name: &str) -> bool {
    (MIN_PREFIX_LENGTH..=OBJECT_ID_LENGTH).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn reference(name: &str) -> Revision {
        Revision::Ref(name.to_string())
    }

    #[test]
    fn alias_expands_to_head() {
        assert_eq!(Revision::try_parse("@").unwrap(), reference("HEAD"));
    }

    #[test]
    fn parent_suffixes_nest() {
        assert_eq!(
            Revision::try_parse("main^^").unwrap(),
            Revision::Parent(Box::new(Revision::Parent(Box::new(reference("main")))))
        );
    }

    #[test]
    fn ancestor_keeps_the_generation_count() {
        assert_eq!(
            Revision::try_parse("HEAD~3").unwrap(),
            Revision::Ancestor(Box::new(reference("HEAD")), 3)
        );
        assert_eq!(
            Revision::try_parse("@~0").unwrap(),
            Revision::Ancestor(Box::new(reference("HEAD")), 0)
        );
    }

    #[test]
    fn parent_of_ancestor() {
        assert_eq!(
            Revision::try_parse("main~2^").unwrap(),
            Revision::Parent(Box::new(Revision::Ancestor(Box::new(reference("main")), 2)))
        );
    }

    #[test]
    fn invalid_names_fail_to_parse() {
        for name in ["", ".invalid", "a..b", "bad name", "x:y", ".invalid^"] {
            assert!(Revision::try_parse(name).is_err(), "{name} should not parse");
        }
    }

    proptest! {
        #[test]
        fn hex_strings_parse_as_refs(oid in "[0-9a-f]{4,40}") {
            prop_assert_eq!(Revision::try_parse(&oid).unwrap(), reference(&oid));
        }

        #[test]
        fn ancestor_suffix_round_trips(name in "[a-z][a-z0-9/-]{0,10}[a-z0-9]", n in 0usize..100) {
            prop_assume!(!name.contains("//"));
            let parsed = Revision::try_parse(&format!("{name}~{n}")).unwrap();

            prop_assert_eq!(parsed, Revision::Ancestor(Box::new(reference(&name)), n));
        }
    }
}
