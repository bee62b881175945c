use crate::areas::database::Database;
use crate::artifacts::objects::commit::{Commit, SlimCommit};
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use tracing::debug;

/// Lazy history walk yielding `(id, commit)` pairs
pub struct RevList<'d> {
    database: &'d Database,
    walk: Walk,
}

enum Walk {
    FirstParent {
        next: Option<ObjectId>,
    },
    Topological {
        commits: HashMap<ObjectId, Commit>,
        /// Reachable children not yet emitted, per commit
        pending_children: HashMap<ObjectId, usize>,
        ready: BinaryHeap<SlimCommit>,
    },
    Done,
}

impl<'d> RevList<'d> {
    /// Follow `parents[0]` from `start`; each commit is read when reached.
    pub fn first_parent(database: &'d Database, start: Option<ObjectId>) -> Self {
        RevList {
            database,
            walk: Walk::FirstParent { next: start },
        }
    }

    /// Every commit reachable from `start`, exactly once. The reachable graph
    /// is read up front to count children, so even `log -n 1` reads the whole
    /// history. This keeps children ahead of parents when committer clocks
    /// are skewed, which a lazy date-ordered frontier cannot promise.
    pub fn full(database: &'d Database, start: Option<ObjectId>) -> anyhow::Result<Self> {
        let Some(start) = start else {
            return Ok(RevList {
                database,
                walk: Walk::Done,
            });
        };

        let mut commits = HashMap::<ObjectId, Commit>::new();
        let mut pending_children = HashMap::<ObjectId, usize>::new();
        let mut stack = vec![start.clone()];

        while let Some(oid) = stack.pop() {
            if commits.contains_key(&oid) {
                continue;
            }

            let commit = database.parse_commit(&oid)?;
            for parent in unique_parents(&commit) {
                *pending_children.entry(parent.clone()).or_default() += 1;
                if !commits.contains_key(parent) {
                    stack.push(parent.clone());
                }
            }
            commits.insert(oid, commit);
        }
        debug!(commits = commits.len(), "history discovered");

        let mut ready = BinaryHeap::new();
        if let Some(commit) = commits.get(&start) {
            ready.push(commit.to_slim(start));
        }

        Ok(RevList {
            database,
            walk: Walk::Topological {
                commits,
                pending_children,
                ready,
            },
        })
    }

    pub fn new(
        database: &'d Database,
        start: Option<ObjectId>,
        first_parent: bool,
    ) -> anyhow::Result<Self> {
        if first_parent {
            Ok(Self::first_parent(database, start))
        } else {
            Self::full(database, start)
        }
    }
}

fn unique_parents(commit: &Commit) -> BTreeSet<&ObjectId> {
    commit.parents().iter().collect()
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.walk {
            Walk::Done => None,
            Walk::FirstParent { next } => {
                let oid = next.take()?;
                match self.database.parse_commit(&oid) {
                    Ok(commit) => {
                        *next = commit.parent().cloned();
                        Some(Ok((oid, commit)))
                    }
                    Err(err) => {
                        self.walk = Walk::Done;
                        Some(Err(err))
                    }
                }
            }
            Walk::Topological {
                commits,
                pending_children,
                ready,
            } => {
                let slim = ready.pop()?;
                let commit = commits.remove(&slim.oid)?;

                for parent in unique_parents(&commit) {
                    let Some(count) = pending_children.get_mut(parent) else {
                        continue;
                    };
                    *count -= 1;
                    if *count == 0
                        && let Some(parent_commit) = commits.get(parent)
                    {
                        ready.push(parent_commit.to_slim(parent.clone()));
                    }
                }

                Some(Ok((slim.oid, commit)))
            }
        }
    }
}
