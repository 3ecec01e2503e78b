//! Error types for the synchronization engine.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building the repository.
///
/// Most variants only cost the descriptor being processed; see
/// [`SyncError::is_descriptor_local`].
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("no release found for {repo} (does it have a published release or tag?)")]
    ReleaseNotFound { repo: String },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("malformed archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("release version '{0}' cannot be used as a directory name")]
    InvalidVersion(String),

    #[error("invalid descriptor {file}: {message}")]
    Descriptor { file: String, message: String },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write repository manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error(
        "public directory {} is locked by another run. If this is incorrect, delete its .extrepo.lock",
        .0.display()
    )]
    Locked(PathBuf),
}

impl SyncError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the run recovers by skipping the current descriptor.
    ///
    /// Only the root manifest write, cancellation and the run lock end a run.
    pub fn is_descriptor_local(&self) -> bool {
        !matches!(
            self,
            SyncError::Manifest { .. } | SyncError::Cancelled | SyncError::Locked(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
