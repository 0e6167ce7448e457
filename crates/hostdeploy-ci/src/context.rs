//! GitHub Actions runtime context.
//!
//! Read once from the runner environment (`GITHUB_REPOSITORY`,
//! `GITHUB_EVENT_PATH`, `GITHUB_SHA`, `GITHUB_API_URL`) and passed around
//! by reference afterwards.

use std::path::Path;

use hostdeploy_core::{DeployError, Result};
use serde::Deserialize;

use crate::github::RepoRef;

/// Default REST endpoint when `GITHUB_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The pull request that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub number: u64,
    pub head_sha: String,
    pub head_ref: String,
}

impl PullRequestContext {
    /// First seven characters of the head commit.
    pub fn short_sha(&self) -> &str {
        match self.head_sha.char_indices().nth(7) {
            Some((idx, _)) => &self.head_sha[..idx],
            None => &self.head_sha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub repo: Option<RepoRef>,
    pub sha: Option<String>,
    pub pull_request: Option<PullRequestContext>,
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Debug, Deserialize)]
struct EventPullRequest {
    number: u64,
    head: EventHead,
}

#[derive(Debug, Deserialize)]
struct EventHead {
    sha: String,
    #[serde(rename = "ref")]
    git_ref: String,
}

impl ActionContext {
    /// Build the context from the runner environment.
    ///
    /// A missing event file yields a context without a pull request; an
    /// unreadable or malformed one is an error.
    pub fn from_env() -> Result<Self> {
        let repo = match non_empty_var("GITHUB_REPOSITORY") {
            Some(value) => Some(RepoRef::parse(&value)?),
            None => None,
        };
        let pull_request = match non_empty_var("GITHUB_EVENT_PATH") {
            Some(path) if Path::new(&path).exists() => Self::read_event(Path::new(&path))?,
            _ => None,
        };
        Ok(Self {
            repo,
            sha: non_empty_var("GITHUB_SHA"),
            pull_request,
            api_url: non_empty_var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    /// Extract the pull request (if any) from a webhook event file.
    pub fn read_event(path: &Path) -> Result<Option<PullRequestContext>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_event(&content)
    }

    pub fn parse_event(content: &str) -> Result<Option<PullRequestContext>> {
        let payload: EventPayload = serde_json::from_str(content)?;
        Ok(payload.pull_request.map(|pr| PullRequestContext {
            number: pr.number,
            head_sha: pr.head.sha,
            head_ref: pr.head.git_ref,
        }))
    }

    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Commit that status checks attach to: the PR head, else `GITHUB_SHA`.
    pub fn head_sha(&self) -> Option<&str> {
        self.pull_request
            .as_ref()
            .map(|pr| pr.head_sha.as_str())
            .or(self.sha.as_deref())
    }

    pub fn require_repo(&self) -> Result<&RepoRef> {
        self.repo
            .as_ref()
            .ok_or_else(|| DeployError::InvalidConfig("GITHUB_REPOSITORY is not set".to_string()))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
