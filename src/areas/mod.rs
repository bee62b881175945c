//! Repository areas
//!
//! - `database`: content-addressed object store
//! - `index`: staging area
//! - `refs`: HEAD and branches
//! - `workspace`: working tree files
//! - `config`: repository settings
//! - `repository`: ties the areas of one repository together

pub mod config;
pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
