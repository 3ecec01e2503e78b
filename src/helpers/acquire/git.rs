//! Git helpers
//!
//! Thin wrappers over the `git` CLI used by the clone-based resolver.
//! Every function takes the repository path explicitly; nothing depends on
//! the process's working directory.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::core::error::{Result, SyncError};
use crate::core::output;
use crate::helpers::internal::progress::{self, ProgressGuard};

/// Run `git -C <repo> <args>` and return its trimmed stdout.
fn run_git(repo: &Path, args: &[&str]) -> Result<String> {
    let command = args.first().copied().unwrap_or("git").to_string();
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| SyncError::Git {
            command: command.clone(),
            stderr: format!("failed to run git: {}", e),
        })?;

    if !output.status.success() {
        return Err(SyncError::Git {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Clone `url` into `dest` (which must not exist or be empty).
///
/// A failing clone is reported as a `Network` error: the usual causes are
/// an unreachable host or a missing repository.
pub fn git_clone(url: &str, dest: &Path) -> Result<()> {
    output::detail(&format!("git clone {}", url));

    let name = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let _guard = ProgressGuard::new(progress::create_spinner(&format!("cloning {}", name)));

    let output = Command::new("git")
        .args(["clone", "--quiet", url])
        .arg(dest)
        // Never block a worker on a credential prompt
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| SyncError::Git {
            command: "clone".into(),
            stderr: format!("failed to run git: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SyncError::Network {
            url: url.to_string(),
            message: format!("git clone failed: {}", stderr.trim()),
        });
    }

    Ok(())
}

/// The most recently committed commit that any tag points at.
///
/// Ordered by commit recency, not tag name. `None` when the repository has
/// no tags.
pub fn latest_tagged_commit(repo: &Path) -> Result<Option<String>> {
    let commit = run_git(repo, &["rev-list", "--tags", "--max-count=1"])?;
    Ok((!commit.is_empty()).then_some(commit))
}

/// Check out `commit` with a detached HEAD.
pub fn checkout_detached(repo: &Path, commit: &str) -> Result<()> {
    run_git(repo, &["checkout", "--quiet", "--detach", commit]).map(|_| ())
}

/// Human-readable name for `commit` derived from the nearest tag.
pub fn describe_tags(repo: &Path, commit: &str) -> Result<String> {
    run_git(repo, &["describe", "--tags", commit])
}
