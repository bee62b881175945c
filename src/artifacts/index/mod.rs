//! Binary index format
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length, sorted by path):
//!   - 62 bytes of stat data, object id and flags
//!   - NUL terminated path, padded to an 8 byte boundary
//!
//! Checksum (20 bytes):
//!   - SHA-1 of all preceding bytes
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

pub const CHECKSUM_SIZE: usize = 20;

pub const HEADER_SIZE: usize = 12;

pub const SIGNATURE: &[u8; 4] = b"DIRC";

pub const VERSION: u32 = 2;
