//! Checkout planning
//!
//! - `conflict`: local state that blocks a non-forced checkout
//! - `migration`: the deletions and writes that move the working tree to the
//!   target tree

pub mod conflict;
pub mod migration;
