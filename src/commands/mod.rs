//! Command implementations
//!
//! Every command is a method on `Repository` that writes its output to the
//! repository writer.
//!
//! - `plumbing`: direct object and index access (hash-object, cat-file, ...)
//! - `porcelain`: user workflows (add, commit, log, checkout, ...)

pub mod plumbing;
pub mod porcelain;
