//! Shared utilities
//!
//! - `lockfile`: exclusive `<file>.lock` guard that doubles as the staging file
//!   for atomic replacement of the index and references

pub mod lockfile;
