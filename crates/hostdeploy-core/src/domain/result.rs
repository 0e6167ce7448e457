//! Typed per-target deployment results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successful preview channel deploy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDeploy {
    pub channel_id: String,

    /// Live URLs, one per hosting site. Never empty.
    pub urls: Vec<String>,

    pub expire_time: DateTime<Utc>,

    /// Raw JSON printed by the deploy tool.
    pub raw: String,
}

/// A successful deploy to the live site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductionDeploy {
    pub hostname: String,
    pub url: String,
    pub raw: String,
}

/// A failed deploy for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployFailure {
    /// Human-readable error message.
    pub message: String,
    pub raw: String,
}

impl DeployFailure {
    pub fn new(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeploySuccess {
    Channel(ChannelDeploy),
    Production(ProductionDeploy),
}

impl DeploySuccess {
    /// Every live URL of this deploy, in tool output order.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            DeploySuccess::Channel(channel) => channel.urls.iter().map(String::as_str).collect(),
            DeploySuccess::Production(production) => vec![production.url.as_str()],
        }
    }

    /// The URL a status check links to.
    pub fn details_url(&self) -> Option<&str> {
        match self {
            DeploySuccess::Channel(channel) => channel.urls.first().map(String::as_str),
            DeploySuccess::Production(production) => Some(production.url.as_str()),
        }
    }

    pub fn expire_time(&self) -> Option<DateTime<Utc>> {
        match self {
            DeploySuccess::Channel(channel) => Some(channel.expire_time),
            DeploySuccess::Production(_) => None,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            DeploySuccess::Channel(channel) => &channel.raw,
            DeploySuccess::Production(production) => &production.raw,
        }
    }
}

/// Outcome of exactly one deploy invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeploymentResult {
    Success(DeploySuccess),
    Error(DeployFailure),
}

impl DeploymentResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentResult::Success(_))
    }

    pub fn success(&self) -> Option<&DeploySuccess> {
        match self {
            DeploymentResult::Success(success) => Some(success),
            DeploymentResult::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DeployFailure> {
        match self {
            DeploymentResult::Success(_) => None,
            DeploymentResult::Error(failure) => Some(failure),
        }
    }

    /// Signature of a successful result, `None` for errors.
    pub fn signature(&self) -> Option<String> {
        self.success().map(crate::signature::derive_signature)
    }
}
