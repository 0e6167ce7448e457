//! Deployment targets and the shared deploy configuration.

use serde::{Deserialize, Serialize};

/// Channel id that selects a production deploy instead of a preview channel.
pub const LIVE_CHANNEL: &str = "live";

/// Whether targets go to a preview channel or the live site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeployMode {
    Preview,
    Production,
}

impl DeployMode {
    /// Production when the channel id is `live`, preview otherwise.
    pub fn from_channel_id(channel_id: Option<&str>) -> Self {
        match channel_id {
            Some(LIVE_CHANNEL) => DeployMode::Production,
            _ => DeployMode::Preview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployMode::Preview => "preview",
            DeployMode::Production => "production",
        }
    }
}

/// Configuration passed to the deploy tool for every target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployConfig {
    /// Firebase project id (`--project`).
    pub project_id: Option<String>,

    /// Hosting site target (`--only`).
    pub site_target: Option<String>,

    /// Resolved preview channel id. Ignored for production deploys.
    pub channel_id: Option<String>,

    /// Channel expiry, e.g. `7d`.
    pub expires: Option<String>,

    /// firebase-tools version passed to `npx`.
    pub tool_version: String,
}

impl DeployConfig {
    /// Hostname of the live site: `<target>.web.app`, else `<project>.web.app`.
    pub fn production_hostname(&self) -> Option<String> {
        self.site_target
            .as_deref()
            .or(self.project_id.as_deref())
            .map(|site| format!("{site}.web.app"))
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            site_target: None,
            channel_id: None,
            expires: None,
            tool_version: "latest".to_string(),
        }
    }
}

/// One unit of work: a package entry point plus its deploy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Package name shown in checks and the PR comment.
    pub name: String,

    /// Directory the deploy tool runs in.
    pub entry_point: String,

    pub config: DeployConfig,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>, entry_point: impl Into<String>, config: DeployConfig) -> Self {
        Self {
            name: name.into(),
            entry_point: entry_point.into(),
            config,
        }
    }
}
