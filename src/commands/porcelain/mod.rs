//! Porcelain commands
//!
//! User facing workflows built from the areas and artifacts: repository
//! setup, staging, committing, history, branches, checkout and inspection.

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod config;
pub mod diff;
pub mod init;
pub mod log;
pub mod rm;
pub mod status;
