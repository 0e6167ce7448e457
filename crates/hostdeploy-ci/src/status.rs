//! Per-target status checks.
//!
//! A [`StatusReporter`] opens one [`StatusCheck`] before a target deploys;
//! the check is consumed by [`StatusCheck::finish`], so it can be finalized
//! only once.

use std::sync::Arc;

use async_trait::async_trait;
use hostdeploy_core::{CheckDetails, DeploymentTarget};
use tracing::info;

use crate::github::{GithubClient, RepoRef};

/// Check run name shown in the pull request UI.
pub const CHECK_NAME: &str = "Deploy Preview";

#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Open a pending check for `target`.
    async fn begin(&self, target: &DeploymentTarget) -> anyhow::Result<Box<dyn StatusCheck>>;
}

#[async_trait]
pub trait StatusCheck: Send {
    async fn finish(self: Box<Self>, details: &CheckDetails) -> anyhow::Result<()>;
}

/// Reporter used when no token or pull request is available: the final
/// details are only logged.
#[derive(Debug, Default, Clone)]
pub struct LogStatusReporter;

struct LogCheck {
    target: String,
}

#[async_trait]
impl StatusReporter for LogStatusReporter {
    async fn begin(&self, target: &DeploymentTarget) -> anyhow::Result<Box<dyn StatusCheck>> {
        Ok(Box::new(LogCheck {
            target: target.name.clone(),
        }))
    }
}

#[async_trait]
impl StatusCheck for LogCheck {
    async fn finish(self: Box<Self>, details: &CheckDetails) -> anyhow::Result<()> {
        info!(
            target = %self.target,
            conclusion = ?details.conclusion,
            title = %details.title,
            summary = %details.summary,
            details_url = details.details_url.as_deref().unwrap_or(""),
            "Deploy finished"
        );
        Ok(())
    }
}

/// Reporter backed by GitHub check runs on the pull request head commit.
#[derive(Clone)]
pub struct GithubCheckReporter {
    client: Arc<GithubClient>,
    repo: RepoRef,
    head_sha: String,
    name_per_package: bool,
}

impl GithubCheckReporter {
    pub fn new(client: Arc<GithubClient>, repo: RepoRef, head_sha: impl Into<String>) -> Self {
        Self {
            client,
            repo,
            head_sha: head_sha.into(),
            name_per_package: false,
        }
    }

    /// Suffix check names with the package so multi-package runs get one
    /// distinguishable check per package.
    pub fn with_package_names(mut self, enabled: bool) -> Self {
        self.name_per_package = enabled;
        self
    }

    pub fn check_name(&self, target: &DeploymentTarget) -> String {
        if self.name_per_package {
            format!("{}: {}", CHECK_NAME, target.name)
        } else {
            CHECK_NAME.to_string()
        }
    }
}

struct GithubCheck {
    client: Arc<GithubClient>,
    repo: RepoRef,
    check_run_id: u64,
}

#[async_trait]
impl StatusReporter for GithubCheckReporter {
    async fn begin(&self, target: &DeploymentTarget) -> anyhow::Result<Box<dyn StatusCheck>> {
        let name = self.check_name(target);
        let run = self
            .client
            .create_check_run(&self.repo, &name, &self.head_sha)
            .await?;
        info!(target = %target.name, check_run_id = run.id, "Created check run");
        Ok(Box::new(GithubCheck {
            client: Arc::clone(&self.client),
            repo: self.repo.clone(),
            check_run_id: run.id,
        }))
    }
}

#[async_trait]
impl StatusCheck for GithubCheck {
    async fn finish(self: Box<Self>, details: &CheckDetails) -> anyhow::Result<()> {
        self.client
            .complete_check_run(&self.repo, self.check_run_id, details)
            .await?;
        Ok(())
    }
}
