//! Release resolution
//!
//! A [`ReleaseResolver`] finds the latest release of a descriptor's GitHub
//! repository. Two strategies exist and one is picked per run:
//!
//! - [`RemoteQueryResolver`] asks the GitHub release API (needs a token to
//!   be practical) and hands back an archive URL.
//! - [`LocalCloneResolver`] clones the repository, checks out the most
//!   recently tagged commit and hands back the working tree itself.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::error::{Result, SyncError};
use crate::descriptor::PackageDescriptor;
use crate::helpers::acquire::{self, HttpClient};
use crate::manifest::{self, INDEX_FILE};

/// Where a resolved release's files come from.
#[derive(Debug)]
pub enum DownloadHandle {
    /// Zip archive still to be fetched
    Archive(String),
    /// Checked-out clone; removed from disk when dropped unless materialized
    Tree(TempDir),
}

/// The latest release of one descriptor.
#[derive(Debug)]
pub struct ResolvedRelease {
    /// Release tag, used verbatim as the version directory name
    pub version: String,
    pub handle: DownloadHandle,
}

/// Strategy for finding a descriptor's latest release.
pub trait ReleaseResolver: Send + Sync {
    /// Resolve the latest release, or `ReleaseNotFound` if there is none.
    fn resolve(&self, descriptor: &PackageDescriptor) -> Result<ResolvedRelease>;

    /// Short name for log output.
    fn name(&self) -> &'static str;
}

/// Reject versions that can't safely name a directory next to `index.json`.
pub fn validate_version(version: &str) -> Result<()> {
    let unsafe_name = version.is_empty()
        || version == "."
        || version == ".."
        || version == INDEX_FILE
        || version.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(SyncError::InvalidVersion(version.to_string()));
    }
    Ok(())
}

/// Resolves through `GET /repos/{owner}/{repo}/releases/latest`.
pub struct RemoteQueryResolver {
    client: HttpClient,
    api_base: String,
}

impl RemoteQueryResolver {
    pub fn new(client: HttpClient, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }
}

impl ReleaseResolver for RemoteQueryResolver {
    fn resolve(&self, descriptor: &PackageDescriptor) -> Result<ResolvedRelease> {
        let locator = &descriptor.source_locator;
        let release = self.client.latest_release(&self.api_base, locator)?;

        let version = release
            .tag_name
            .filter(|tag| !tag.is_empty())
            .ok_or_else(|| SyncError::ReleaseNotFound {
                repo: locator.clone(),
            })?;
        validate_version(&version)?;

        let url = release
            .zipball_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| manifest::archive_url(locator, &version));

        Ok(ResolvedRelease {
            version,
            handle: DownloadHandle::Archive(url),
        })
    }

    fn name(&self) -> &'static str {
        "github-api"
    }
}

/// Resolves by cloning into a scratch directory and reading tag history.
pub struct LocalCloneResolver {
    git_base: String,
    scratch_dir: PathBuf,
}

impl LocalCloneResolver {
    /// `scratch_dir` should be on the same filesystem as the public
    /// directory so the clone can be renamed into place.
    pub fn new(git_base: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_base: git_base.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    fn clone_url(&self, locator: &str) -> String {
        format!("{}/{}.git", self.git_base.trim_end_matches('/'), locator)
    }

    fn scratch_for(&self, repo_name: &str) -> Result<TempDir> {
        std::fs::create_dir_all(&self.scratch_dir)
            .map_err(|e| SyncError::io(&self.scratch_dir, e))?;
        tempfile::Builder::new()
            .prefix(&format!("{}_tmp", repo_name))
            .tempdir_in(&self.scratch_dir)
            .map_err(|e| SyncError::io(&self.scratch_dir, e))
    }
}

/// Find the latest tagged commit of a fresh clone, check it out and name it.
fn describe_latest_tag(repo: &Path, locator: &str) -> Result<String> {
    let commit =
        acquire::latest_tagged_commit(repo)?.ok_or_else(|| SyncError::ReleaseNotFound {
            repo: locator.to_string(),
        })?;
    acquire::checkout_detached(repo, &commit)?;
    // Asked separately from rev-list; a tag pushed in between can make the two disagree.
    acquire::describe_tags(repo, &commit)
}

impl ReleaseResolver for LocalCloneResolver {
    fn resolve(&self, descriptor: &PackageDescriptor) -> Result<ResolvedRelease> {
        let locator = &descriptor.source_locator;
        let scratch = self.scratch_for(descriptor.repo_name())?;

        acquire::git_clone(&self.clone_url(locator), scratch.path())?;
        let version = describe_latest_tag(scratch.path(), locator)?;
        validate_version(&version)?;

        Ok(ResolvedRelease {
            version,
            handle: DownloadHandle::Tree(scratch),
        })
    }

    fn name(&self) -> &'static str {
        "git-clone"
    }
}
