//! Commit history traversal
//!
//! `rev_list` walks history from a starting commit either along first
//! parents only or over the full ancestry. The full walk never emits a commit
//! before all of its reachable children; among commits that are ready it picks
//! the newest committer timestamp, and the larger id on a tie.

pub mod rev_list;
