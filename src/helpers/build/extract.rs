//! Release archive extraction
//!
//! GitHub zipballs wrap everything in a synthetic top-level directory
//! (`<owner>-<repo>-<sha>/`). Extraction drops that first path segment from
//! every entry and skips hidden entries, so the release's files land flat in
//! the destination directory.

use std::fs::File;
use std::path::Path;

use crate::core::error::{Result, SyncError};
use crate::helpers::internal::fs_utils;

/// Path of an archive entry with its synthetic root removed.
///
/// Returns `None` for entries that must not be extracted: the root itself
/// and anything whose stripped path starts with `.` (VCS metadata, dotfiles).
pub fn strip_root(entry_name: &str) -> Option<&str> {
    let stripped = entry_name.split_once('/').map(|(_, rest)| rest)?;
    if stripped.is_empty() || stripped.starts_with('.') {
        return None;
    }
    Some(stripped)
}

/// Create a file, creating its missing parent directory and retrying once.
fn create_file_with_retry(path: &Path) -> Result<File> {
    match File::create(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs_utils::ensure_parent_dir(path)?;
            File::create(path).map_err(|e| SyncError::io(path, e))
        }
        Err(e) => Err(SyncError::io(path, e)),
    }
}

/// Extract a release zip into `dest`, stripping the root segment.
///
/// Returns the number of files written. Entries with unsafe paths are
/// skipped. The caller owns cleanup of `dest` on error.
pub fn extract_release_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let archive_err = |message: String| SyncError::Archive {
        path: archive_path.to_path_buf(),
        message,
    };

    let file = File::open(archive_path).map_err(|e| SyncError::io(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| archive_err(format!("zip read error: {}", e)))?;

    std::fs::create_dir_all(dest).map_err(|e| SyncError::io(dest, e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| archive_err(format!("zip entry error: {}", e)))?;

        let name = entry.name().to_string();
        let Some(relative) = strip_root(&name) else {
            continue;
        };
        let relative = Path::new(relative);
        if !fs_utils::is_safe_path(relative) {
            continue;
        }
        let outpath = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath).map_err(|e| SyncError::io(&outpath, e))?;
            continue;
        }

        // Stream the entry: the size in its header is not trusted.
        let mut outfile = create_file_with_retry(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| archive_err(format!("cannot extract entry {}: {}", name, e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
        written += 1;
    }

    Ok(written)
}
