//! Internal utility modules
//!
//! Shared functionality used by the acquire and build helpers.

pub mod fs_utils;
pub mod progress;
