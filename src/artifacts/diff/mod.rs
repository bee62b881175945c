//! Tree level comparison
//!
//! `tree_source` adapts stored trees, the index and the working tree to a
//! common directory listing interface; `tree_diff` walks two such views and
//! reports which paths changed.

pub mod tree_diff;
pub mod tree_source;
