//! Core infrastructure shared by every stage of a run
//!
//! Error taxonomy, console output and the run lock.

pub mod error;
pub mod lock;
pub mod output;
