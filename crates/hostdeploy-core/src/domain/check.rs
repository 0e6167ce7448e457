//! Status check conclusions rendered from deployment results.

use serde::{Deserialize, Serialize};

use super::result::{DeployFailure, DeploySuccess};
use super::target::DeployMode;
use crate::comment::urls_markdown;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
}

/// Final state written to a status check when its target settles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckDetails {
    pub conclusion: CheckConclusion,
    pub title: String,
    /// Markdown summary.
    pub summary: String,
    pub details_url: Option<String>,
}

impl CheckDetails {
    pub fn for_success(success: &DeploySuccess) -> Self {
        let (title, summary) = match success {
            DeploySuccess::Channel(_) => (
                "Deploy preview succeeded".to_string(),
                urls_markdown(&success.urls()),
            ),
            DeploySuccess::Production(production) => (
                "Production deploy succeeded".to_string(),
                format!("[{}]({})", production.hostname, production.url),
            ),
        };
        Self {
            conclusion: CheckConclusion::Success,
            title,
            summary,
            details_url: success.details_url().map(str::to_string),
        }
    }

    pub fn for_failure(mode: DeployMode, failure: &DeployFailure) -> Self {
        let title = match mode {
            DeployMode::Preview => "Deploy preview failed",
            DeployMode::Production => "Production deploy failed",
        };
        Self {
            conclusion: CheckConclusion::Failure,
            title: title.to_string(),
            summary: format!("Error: {}", failure.message),
            details_url: None,
        }
    }
}
