//! Freshness detection: blake3 content hashes decide whether a tracked file
//! really changed.

mod detect;
mod hash;

pub use detect::{Detection, check, check_blocking};
pub use hash::ContentHash;
