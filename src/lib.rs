//! A small content-addressed version control system
//!
//! - `areas`: the on-disk stores of a repository (objects, index, refs,
//!   working tree, config)
//! - `artifacts`: object formats and the algorithms over them
//! - `commands`: the operations exposed by the `vcs` binary
//! - `errors`: typed failure kinds

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
