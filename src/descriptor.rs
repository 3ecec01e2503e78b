//! Package descriptors
//!
//! A descriptor is a small YAML file naming one package and the GitHub
//! repository it is published from:
//!
//! ```yaml
//! id: org.example.folders
//! name: Folders
//! content_type: SN|Component
//! area: tags-list
//! github: example/folders-component
//! main: dist/index.html
//! flags: [Beta]
//! ```
//!
//! Files whose name ends in `theme.yaml` describe themes; every other
//! `*.yaml` file describes a regular package.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, SyncError};
use crate::helpers::internal::fs_utils;

/// File name suffix that marks a theme descriptor
pub const THEME_SUFFIX: &str = "theme.yaml";

/// Which group a descriptor belongs to. Regular packages sort first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DescriptorKind {
    #[default]
    Regular,
    Theme,
}

impl DescriptorKind {
    /// Classify a descriptor by its file name.
    pub fn from_file_name(file_name: &str) -> Self {
        if file_name.ends_with(THEME_SUFFIX) {
            DescriptorKind::Theme
        } else {
            DescriptorKind::Regular
        }
    }
}

/// One package, as declared in its descriptor file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageDescriptor {
    #[serde(rename = "id")]
    pub identifier: String,
    pub name: String,
    pub content_type: String,
    /// `owner/repo` on GitHub
    #[serde(rename = "github")]
    pub source_locator: String,
    /// Entry file, relative to the version directory
    #[serde(rename = "main")]
    pub main_entry: String,

    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub marketing_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub dock_icon: Option<serde_json::Value>,
    #[serde(default)]
    pub layerable: Option<bool>,
    #[serde(default, rename = "statusBar")]
    pub status_bar: Option<bool>,

    #[serde(skip)]
    pub kind: DescriptorKind,
    /// File the descriptor was read from; also its ordering key
    #[serde(skip)]
    pub file_name: String,
}

impl PackageDescriptor {
    /// Last path segment of the GitHub locator; names the package's public directory.
    pub fn repo_name(&self) -> &str {
        self.source_locator
            .rsplit('/')
            .next()
            .unwrap_or(&self.source_locator)
    }

    /// Key used to order descriptors within their kind.
    pub fn sort_key(&self) -> &str {
        if self.file_name.is_empty() {
            &self.identifier
        } else {
            &self.file_name
        }
    }

    /// Parse a descriptor from YAML text. `file_name` decides the kind.
    pub fn from_yaml(file_name: &str, content: &str) -> Result<Self> {
        let mut descriptor: PackageDescriptor =
            serde_yaml::from_str(content).map_err(|e| SyncError::Descriptor {
                file: file_name.to_string(),
                message: e.to_string(),
            })?;
        descriptor.kind = DescriptorKind::from_file_name(file_name);
        descriptor.file_name = file_name.to_string();
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the fields every later stage relies on.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: String| SyncError::Descriptor {
            file: self.sort_key().to_string(),
            message,
        };

        if self.identifier.trim().is_empty() {
            return Err(fail("'id' must not be empty".into()));
        }
        if self.main_entry.trim().is_empty() {
            return Err(fail("'main' must not be empty".into()));
        }
        validate_locator(&self.source_locator).map_err(fail)
    }
}

/// A locator is `owner/repo`: exactly two plain path segments.
fn validate_locator(locator: &str) -> std::result::Result<(), String> {
    let segments: Vec<&str> = locator.split('/').collect();
    if segments.len() != 2 {
        return Err(format!("'github' must be owner/repo, got '{}'", locator));
    }
    for segment in segments {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(format!("'github' has an invalid segment: '{}'", locator));
        }
    }
    Ok(())
}

/// Read and validate one descriptor file.
pub fn load(path: &Path) -> Result<PackageDescriptor> {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
    PackageDescriptor::from_yaml(&file_name, &content)
}

/// Descriptors found in a directory, and the files that failed to load.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Regular descriptors by file name, then themes by file name
    pub descriptors: Vec<PackageDescriptor>,
    /// One error per unreadable or invalid file, in the same order
    pub rejected: Vec<SyncError>,
}

/// Find every `*.yaml` descriptor in `dir`.
///
/// A file that fails to load only costs itself: its error lands in
/// [`Discovered::rejected`] and the rest are still returned. Only a missing
/// or unlistable directory is an error.
pub fn discover(dir: &Path) -> Result<Discovered> {
    let mut paths = descriptor_paths(dir)?;
    paths.sort_by(|a, b| {
        let (a_name, b_name) = (file_name_of(a), file_name_of(b));
        DescriptorKind::from_file_name(&a_name)
            .cmp(&DescriptorKind::from_file_name(&b_name))
            .then_with(|| a_name.cmp(&b_name))
    });

    let mut found = Discovered::default();
    for path in &paths {
        match load(path) {
            Ok(descriptor) => found.descriptors.push(descriptor),
            Err(e) => found.rejected.push(e),
        }
    }
    Ok(found)
}

fn descriptor_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SyncError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "descriptor directory not found"),
        ));
    }
    let pattern = dir.join("*.yaml");
    fs_utils::glob_paths(&pattern.to_string_lossy())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
