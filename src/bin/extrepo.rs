//! extrepo CLI - build a static extension repository
//!
//! Usage:
//!   extrepo                         Build ./public from ./extensions
//!   extrepo --base-dir site         Build site/public from site/extensions
//!   GITHUB_TOKEN=... extrepo        Resolve releases through the GitHub API

use anyhow::{Context, Result};
use clap::Parser;
use extrepo::helpers::acquire::HttpClient;
use extrepo::helpers::acquire::http::{self, DEFAULT_HTTP_TIMEOUT_SECS, GITHUB_API_BASE};
use extrepo::{
    CancelFlag, LocalCloneResolver, ReleaseMaterializer, ReleaseResolver, RemoteQueryResolver,
    SyncConfig, SyncDriver, descriptor, output,
};
use std::path::PathBuf;

/// Default public base URL
const DEFAULT_URL: &str = "https://snext.netlify.app/";

#[derive(Parser)]
#[command(name = "extrepo")]
#[command(about = "Build a versioned static package repository from GitHub releases")]
#[command(version)]
struct Cli {
    /// Directory containing `extensions/` and `public/`
    #[arg(short = 'd', long, default_value = ".")]
    base_dir: PathBuf,

    /// Descriptor directory (default: <base-dir>/extensions)
    #[arg(long)]
    extensions_dir: Option<PathBuf>,

    /// Output directory (default: <base-dir>/public)
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Public URL the repository is served from
    #[arg(short, long, env = "URL", default_value = DEFAULT_URL)]
    url: String,

    /// GitHub token; when set, releases are resolved through the GitHub API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Number of packages processed in parallel (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// HTTP timeout in seconds (clamped to 5-300)
    #[arg(long, env = "EXTREPO_HTTP_TIMEOUT", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    http_timeout: u64,

    /// GitHub API base URL
    #[arg(long, hide = true, default_value = GITHUB_API_BASE)]
    api_base: String,

    /// Base URL repositories are cloned from
    #[arg(long, hide = true, default_value = "https://github.com")]
    git_base: String,
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let extensions_dir = cli
        .extensions_dir
        .unwrap_or_else(|| cli.base_dir.join("extensions"));
    let public_dir = cli.public_dir.unwrap_or_else(|| cli.base_dir.join("public"));
    std::fs::create_dir_all(&public_dir)
        .with_context(|| format!("Failed to create public directory: {}", public_dir.display()))?;

    let discovered = descriptor::discover(&extensions_dir).with_context(|| {
        format!(
            "Failed to load descriptors from {}",
            extensions_dir.display()
        )
    })?;
    for rejected in &discovered.rejected {
        output::warning(&format!("Skipping descriptor: {}", rejected));
    }

    // Token set to an empty string counts as absent
    let token = cli.github_token.filter(|t| !t.trim().is_empty());
    let client = HttpClient::new(http::clamp_timeout(cli.http_timeout), token.clone());

    let resolver: Box<dyn ReleaseResolver> = match token {
        Some(_) => {
            output::info("GitHub token set, resolving releases through the API");
            Box::new(RemoteQueryResolver::new(client.clone(), cli.api_base))
        }
        None => {
            output::info("No GitHub token, resolving releases by cloning tags");
            Box::new(LocalCloneResolver::new(cli.git_base, &public_dir))
        }
    };

    let jobs = cli.jobs.unwrap_or_else(num_cpus::get);
    let config = SyncConfig::new(&public_dir, &cli.url).with_jobs(jobs);
    let base_url = config.base_url.clone();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        output::warning("interrupted, finishing packages already in progress");
        handler_flag.cancel();
    })
    .context("Failed to set signal handler")?;

    output::action(&format!("Building repository in {}", public_dir.display()));

    let driver = SyncDriver::new(
        config,
        resolver,
        Box::new(ReleaseMaterializer::new(client)),
    )
    .with_cancel_flag(cancel);
    let report = driver
        .run(discovered.descriptors)
        .context("Repository build failed")?;

    let (regular, themes) = report.kinds();
    let skipped = report.failed() + discovered.rejected.len();
    output::summary(regular, themes, skipped, &base_url);
    if report.updated() == 0 {
        output::success("Repository already up to date");
    } else {
        output::success(&format!("{} package(s) updated", report.updated()));
    }

    Ok(())
}
