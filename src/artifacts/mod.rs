//! Repository data structures and algorithms
//!
//! - `branch`: branch names and revision expressions
//! - `checkout`: checkout guard and working tree migration
//! - `core`: lock files
//! - `database`: tree entry type shared by trees and diffs
//! - `diff`: tree views and the lock-step tree comparison
//! - `index`: on-disk index format
//! - `log`: history traversal
//! - `objects`: blobs, trees, commits and the tree builder
//! - `status`: staged and unstaged change detection

pub mod branch;
pub mod checkout;
pub mod core;
pub mod database;
pub mod diff;
pub mod index;
pub mod log;
pub mod objects;
pub mod status;
