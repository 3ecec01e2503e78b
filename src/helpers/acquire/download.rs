//! Download helpers for fetching release archives

use std::io::{Read, Write};
use std::path::Path;

use super::http::HttpClient;
use crate::core::error::{Result, SyncError};
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::{self, ProgressGuard};

/// Download `url` to `dest`, streaming the body to disk.
///
/// Returns the number of bytes written. Non-2xx responses and transport
/// failures are `Network` errors; the caller removes `dest` on failure.
pub fn download(client: &HttpClient, url: &str, dest: &Path) -> Result<u64> {
    fs_utils::ensure_parent_dir(dest)?;

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let guard = ProgressGuard::new(progress::create_spinner(&format!("downloading {}", filename)));

    let network_err = |message: String| SyncError::Network {
        url: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .call()
        .map_err(|e| network_err(format!("download failed: {}", e)))?;

    // Get content length if available and upgrade progress bar
    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        progress::upgrade_to_bytes(guard.bar(), len);
    }

    let mut file = std::fs::File::create(dest).map_err(|e| SyncError::io(dest, e))?;

    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| network_err(format!("read error: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| SyncError::io(dest, e))?;

        total_bytes += bytes_read as u64;
        guard.bar().set_position(total_bytes);
    }

    Ok(total_bytes)
}
