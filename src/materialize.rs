//! Materialization: turning a resolved release into its version directory
//!
//! A version directory only ever appears fully populated. Partial output
//! (a half-extracted tree, the downloaded zip) is guarded and removed when
//! anything fails, so the sync driver can treat "directory exists" as
//! "release already materialized".

use std::path::{Path, PathBuf};

use crate::core::error::{Result, SyncError};
use crate::helpers::acquire::{self, HttpClient};
use crate::helpers::build;
use crate::helpers::internal::fs_utils::{self, CleanupGuard};
use crate::resolver::DownloadHandle;

/// Writes a release's files into a version directory that does not exist yet.
pub trait Materializer: Send + Sync {
    fn materialize(&self, handle: DownloadHandle, version_dir: &Path) -> Result<()>;
}

/// Materializer that downloads archives over HTTP and moves clones into place.
pub struct ReleaseMaterializer {
    client: HttpClient,
}

impl ReleaseMaterializer {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Materializer for ReleaseMaterializer {
    fn materialize(&self, handle: DownloadHandle, version_dir: &Path) -> Result<()> {
        match handle {
            DownloadHandle::Archive(url) => {
                let archive = archive_path_for(version_dir);
                let archive_guard = CleanupGuard::new(&archive);
                acquire::download(&self.client, &url, archive_guard.path())?;
                // materialize_archive owns cleanup from here
                archive_guard.disarm();
                materialize_archive(&archive, version_dir)
            }
            DownloadHandle::Tree(scratch) => materialize_tree(scratch.path(), version_dir),
        }
    }
}

/// `<repo>/<version>.zip`, next to the version directory.
pub fn archive_path_for(version_dir: &Path) -> PathBuf {
    let mut name = version_dir
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".zip");
    version_dir.with_file_name(name)
}

/// Extract a downloaded zip into `version_dir`, then delete the zip.
///
/// On failure both the partial directory and the archive are removed.
pub fn materialize_archive(archive: &Path, version_dir: &Path) -> Result<()> {
    let archive_guard = CleanupGuard::new(archive);
    let dir_guard = CleanupGuard::new(version_dir);

    build::extract_release_zip(archive, version_dir)?;
    fs_utils::remove_file_if_exists(archive)?;

    archive_guard.disarm();
    dir_guard.disarm();
    Ok(())
}

/// Move a checked-out clone to `version_dir` and drop its `.git`.
pub fn materialize_tree(tree: &Path, version_dir: &Path) -> Result<()> {
    fs_utils::ensure_parent_dir(version_dir)?;
    if version_dir.exists() {
        return Err(SyncError::io(
            version_dir,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "version directory already exists",
            ),
        ));
    }

    std::fs::rename(tree, version_dir).map_err(|e| SyncError::io(version_dir, e))?;
    let dir_guard = CleanupGuard::new(version_dir);

    fs_utils::remove_dir_if_exists(&version_dir.join(".git"))?;

    dir_guard.disarm();
    Ok(())
}
