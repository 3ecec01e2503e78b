//! Static package repository builder
//!
//! Reads package descriptors (YAML files pointing at GitHub repositories),
//! fetches each package's latest release into a version-labeled directory
//! and writes the JSON manifests a client polls as its update feed.
//!
//! # Layout
//!
//! ```text
//! public/
//!   <repo-name>/
//!     <version>/     # one per released version, flat extracted contents
//!     index.json     # latest package manifest
//!   index.json       # repository manifest listing every package
//! ```
//!
//! # Pipeline
//!
//! - [`descriptor`] - load and validate descriptors
//! - [`resolver`] - find the latest release (GitHub API or git clone)
//! - [`materialize`] - write a release into its version directory
//! - [`manifest`] - build and write package/repository manifests
//! - [`sync`] - drive all of the above, incrementally and in parallel
//!
//! Runs are idempotent: a version directory that already exists is never
//! fetched again, and neither is its package manifest rewritten.

pub mod core;
pub mod descriptor;
pub mod helpers;
pub mod manifest;
pub mod materialize;
pub mod resolver;
pub mod sync;

pub use crate::core::error::{Result, SyncError};
pub use crate::core::output;
pub use descriptor::{DescriptorKind, Discovered, PackageDescriptor};
pub use materialize::{Materializer, ReleaseMaterializer};
pub use resolver::{
    DownloadHandle, LocalCloneResolver, ReleaseResolver, RemoteQueryResolver, ResolvedRelease,
};
pub use sync::{CancelFlag, Outcome, SyncConfig, SyncDriver, SyncReport};
