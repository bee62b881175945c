//! Plumbing commands
//!
//! Direct access to objects and the index, for scripts and tests:
//! `hash-object`, `cat-file`, `ls-files`, `ls-tree`, `write-tree` and the
//! ref-free commit writer behind `commit`.

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
pub mod ls_tree;
pub mod write_commit;
pub mod write_tree;
