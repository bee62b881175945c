//! Working tree status
//!
//! - `file_change`: per-path change kinds for the index and working tree columns
//! - `status_info`: the two comparisons behind `status` and the checkout guard

pub mod file_change;
pub mod status_info;
