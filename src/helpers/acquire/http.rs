//! HTTP access to GitHub
//!
//! A small wrapper around a `ureq` agent that applies the configured
//! timeout, a User-Agent and, when a token is configured, bearer auth.
//!
//! ## GitHub Authentication
//!
//! A token raises the API rate limit from 60/hr to 5000/hr. Its presence is
//! also what selects the release API over cloning for a whole run.

use serde::Deserialize;
use std::time::Duration;

use crate::core::error::{Result, SyncError};

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default GitHub API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "extrepo-repository-builder";

/// Clamp a user-supplied timeout to a reasonable range (5-300 seconds)
pub fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 300))
}

/// The parts of GitHub's "latest release" object the builder uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestRelease {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
}

/// Blocking HTTP client shared by every worker of a run.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(timeout: Duration, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self { agent, token }
    }

    /// Build a GET request with auth applied.
    pub fn get(&self, url: &str) -> ureq::Request {
        let request = self.agent.get(url);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Query `GET {api_base}/repos/{repo}/releases/latest`.
    ///
    /// A 404 means the repository has no published release.
    pub fn latest_release(&self, api_base: &str, repo: &str) -> Result<LatestRelease> {
        let url = format!("{}/repos/{}/releases/latest", api_base.trim_end_matches('/'), repo);

        let response = self
            .get(&url)
            .set("Accept", "application/vnd.github.v3+json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(404, _) => SyncError::ReleaseNotFound {
                    repo: repo.to_string(),
                },
                ureq::Error::Status(403, _) => SyncError::Network {
                    url: url.clone(),
                    message: "GitHub API rate limit exceeded or token rejected".into(),
                },
                other => SyncError::Network {
                    url: url.clone(),
                    message: other.to_string(),
                },
            })?;

        response
            .into_json::<LatestRelease>()
            .map_err(|e| SyncError::Network {
                url: url.clone(),
                message: format!("failed to parse GitHub response: {}", e),
            })
    }
}
