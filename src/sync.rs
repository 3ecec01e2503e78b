//! Sync driver
//!
//! One run walks every descriptor through:
//!
//! ```text
//! Unresolved --resolve--> Resolved --version dir exists?--> UpToDate
//!                                  \-------------------------> Updated
//! Unresolved --resolve fails--> Failed
//! ```
//!
//! Descriptors are independent (each owns `public/<repo>/`), so they run on
//! a bounded worker pool. Results are buffered by input position, which
//! keeps the repository manifest in descriptor order regardless of which
//! worker finishes first. A failed descriptor is reported and left out of
//! the manifest; it never stops the run.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::error::{Result, SyncError};
use crate::core::{lock, output};
use crate::descriptor::{DescriptorKind, PackageDescriptor};
use crate::helpers::internal::progress;
use crate::manifest::{self, PackageManifest, RepositoryManifest};
use crate::materialize::Materializer;
use crate::resolver::ReleaseResolver;

/// Shared flag for stopping a run between descriptors.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the published tree
    pub public_dir: PathBuf,
    /// Prefix for every absolute URL in the manifests, without trailing slash
    pub base_url: String,
    /// Worker threads
    pub jobs: usize,
}

impl SyncConfig {
    pub fn new(public_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            public_dir: public_dir.into(),
            base_url: normalize_base_url(base_url),
            jobs: 1,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

/// Trim trailing slashes so URLs can be joined with `/`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Terminal state of one descriptor.
#[derive(Debug)]
pub enum Outcome {
    /// A new version directory and package manifest were written
    Updated(PackageManifest),
    /// The latest version was already on disk; nothing was written
    UpToDate(PackageManifest),
    /// Resolution or materialization failed; left out of the manifest
    Failed(SyncError),
}

impl Outcome {
    pub fn manifest(&self) -> Option<&PackageManifest> {
        match self {
            Outcome::Updated(m) | Outcome::UpToDate(m) => Some(m),
            Outcome::Failed(_) => None,
        }
    }
}

/// What happened to one descriptor.
#[derive(Debug)]
pub struct PackageReport {
    pub identifier: String,
    pub file_name: String,
    pub kind: DescriptorKind,
    pub outcome: Outcome,
}

/// Result of a whole run.
#[derive(Debug)]
pub struct SyncReport {
    pub packages: Vec<PackageReport>,
    pub manifest: RepositoryManifest,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.packages.iter().filter(|p| pred(&p.outcome)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated(_)))
    }

    pub fn up_to_date(&self) -> usize {
        self.count(|o| matches!(o, Outcome::UpToDate(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Descriptors processed, split into (regular, theme).
    pub fn kinds(&self) -> (usize, usize) {
        let themes = self
            .packages
            .iter()
            .filter(|p| p.kind == DescriptorKind::Theme)
            .count();
        (self.packages.len() - themes, themes)
    }
}

/// Drives resolution, materialization and manifest output for a run.
pub struct SyncDriver {
    config: SyncConfig,
    resolver: Box<dyn ReleaseResolver>,
    materializer: Box<dyn Materializer>,
    cancel: CancelFlag,
}

impl SyncDriver {
    pub fn new(
        config: SyncConfig,
        resolver: Box<dyn ReleaseResolver>,
        materializer: Box<dyn Materializer>,
    ) -> Self {
        Self {
            config,
            resolver,
            materializer,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Bring one descriptor up to date.
    ///
    /// The version-directory check runs after resolution: for clones it
    /// uses the clone's own version, and a clone that turns out to be
    /// redundant is dropped (and deleted) instead of materialized.
    pub fn sync_one(&self, descriptor: &PackageDescriptor) -> Result<Outcome> {
        let public_dir = &self.config.public_dir;
        let repo_name = descriptor.repo_name();

        let resolved = self.resolver.resolve(descriptor)?;
        let manifest =
            manifest::build_package_manifest(descriptor, &resolved.version, &self.config.base_url);

        let version_dir = version_dir(public_dir, descriptor, &resolved.version);
        if version_dir.exists() {
            return Ok(Outcome::UpToDate(manifest));
        }

        self.materializer.materialize(resolved.handle, &version_dir)?;

        if let Err(e) = manifest::write_package_manifest(public_dir, repo_name, &manifest) {
            // Without its manifest the version would look current forever.
            let _ = std::fs::remove_dir_all(&version_dir);
            return Err(e);
        }
        Ok(Outcome::Updated(manifest))
    }

    /// Run one descriptor to a terminal state.
    ///
    /// Descriptor-local errors become [`Outcome::Failed`]; anything else
    /// (cancellation included) is returned and ends the run.
    fn process(&self, descriptor: &PackageDescriptor) -> Result<PackageReport> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let outcome = match self.sync_one(descriptor) {
            Ok(outcome) => outcome,
            Err(e) if e.is_descriptor_local() => Outcome::Failed(e),
            Err(e) => return Err(e),
        };
        report_outcome(descriptor, &outcome);

        Ok(PackageReport {
            identifier: descriptor.identifier.clone(),
            file_name: descriptor.file_name.clone(),
            kind: descriptor.kind,
            outcome,
        })
    }

    /// Process every descriptor and write `public/index.json`.
    ///
    /// Descriptors are ordered regular-first, then by file name (or
    /// identifier when there is no file), and that order is the order of
    /// the repository manifest.
    pub fn run(&self, mut descriptors: Vec<PackageDescriptor>) -> Result<SyncReport> {
        let public_dir = &self.config.public_dir;
        std::fs::create_dir_all(public_dir).map_err(|e| SyncError::io(public_dir, e))?;
        let _lock = lock::acquire_run_lock(public_dir)?;

        descriptors.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.sort_key().cmp(b.sort_key()))
        });

        output::detail(&format!(
            "resolving {} packages via {} ({} workers)",
            descriptors.len(),
            self.resolver.name(),
            self.config.jobs
        ));
        progress::set_enabled(self.config.jobs == 1);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .thread_name(|i| format!("extrepo-worker-{}", i))
            .build()
            .map_err(|e| SyncError::io(public_dir, std::io::Error::other(e)))?;

        // Indexed collect keeps input order, whatever the completion order.
        let results: Vec<Result<PackageReport>> =
            pool.install(|| descriptors.par_iter().map(|d| self.process(d)).collect());

        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let packages = results.into_iter().collect::<Result<Vec<_>>>()?;

        let manifest = manifest::build_repository_manifest(
            packages
                .iter()
                .filter_map(|p| p.outcome.manifest().cloned())
                .collect(),
        );
        manifest::write_repository_manifest(public_dir, &manifest)?;

        Ok(SyncReport { packages, manifest })
    }
}

fn report_outcome(descriptor: &PackageDescriptor, outcome: &Outcome) {
    match outcome {
        Outcome::Updated(m) => output::updated(descriptor.kind, &descriptor.name, &m.version),
        Outcome::UpToDate(m) => output::up_to_date(descriptor.kind, &descriptor.name, &m.version),
        Outcome::Failed(e) => output::warning(&format!(
            "Unable to update {} ({}): {}",
            descriptor.name,
            descriptor.sort_key(),
            e
        )),
    }
}

/// Path of the version directory a descriptor's `version` would occupy.
pub fn version_dir(public_dir: &Path, descriptor: &PackageDescriptor, version: &str) -> PathBuf {
    public_dir.join(descriptor.repo_name()).join(version)
}
