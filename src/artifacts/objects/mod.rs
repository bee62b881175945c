//! Object model of the store
//!
//! Every durable value is one of three immutable object kinds sharing a single
//! canonical serialization, `<kind> <size>\0<content>`, whose SHA-1 digest is the
//! object's identity:
//!
//! - **Blob**: raw file content
//! - **Tree**: sorted directory listing of names, modes and object ids
//! - **Commit**: snapshot tree, parents, author, committer and message
//!
//! `tree_builder` turns the flat staging table into the tree graph.

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;
pub mod tree_builder;

/// Length of a SHA-1 digest in hexadecimal
pub const OBJECT_ID_LENGTH: usize = 40;

/// Shortest object id prefix accepted when resolving abbreviations
pub const MIN_PREFIX_LENGTH: usize = 4;
