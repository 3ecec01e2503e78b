//! Acquire helpers - getting releases from GitHub
//!
//! ## Functions
//!
//! - **http**: `HttpClient` and the "latest release" API query
//! - **download**: Stream a release archive to disk
//! - **git**: Clone, find the latest tagged commit, describe it

pub mod download;
pub mod git;
pub mod http;

// Re-export commonly used items
pub use download::download;
pub use git::{checkout_detached, describe_tags, git_clone, latest_tagged_commit};
pub use http::{HttpClient, LatestRelease};
