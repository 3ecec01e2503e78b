//! Run lock management
//!
//! Provides exclusive locking so two runs never write the same public tree.

use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::error::{Result, SyncError};

/// Name of the lock file inside the public directory
pub const LOCK_FILE_NAME: &str = ".extrepo.lock";

/// Acquire an exclusive lock on a public directory.
/// Returns a guard that releases the lock when dropped.
///
/// The lock is held by the open file, not by the file's existence: a lock
/// file left behind by a crashed run is simply locked again.
pub fn acquire_run_lock(public_dir: &Path) -> Result<RunLock> {
    let lock_path = public_dir.join(LOCK_FILE_NAME);

    let lock_file = File::create(&lock_path).map_err(|e| SyncError::io(&lock_path, e))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(SyncError::Locked(public_dir.to_path_buf()));
    }

    Ok(RunLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the run lock - releases lock and deletes lock file when dropped
#[derive(Debug)]
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
