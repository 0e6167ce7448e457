//! Tracked pull-request comment rendering.
//!
//! The comment lists every successfully deployed package with its URLs,
//! expiry and signature. Its footer carries [`TRACKING_TOKEN`], which is how
//! later runs find the comment again to update it in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DeploySuccess;
use crate::signature::derive_signature;

/// Opaque marker identifying the tracked comment. Must never change.
pub const TRACKING_TOKEN: &str = "65f014ba-2d77-4f11-bbac-0117b42f907b";

/// One package section of the comment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentEntry {
    pub package: String,
    pub deployment: DeploySuccess,
}

impl CommentEntry {
    pub fn new(package: impl Into<String>, deployment: DeploySuccess) -> Self {
        Self {
            package: package.into(),
            deployment,
        }
    }
}

/// A single URL renders as one inline link; several become a list.
pub fn urls_markdown(urls: &[&str]) -> String {
    match urls {
        [url] => format!("[{url}]({url})"),
        _ => urls
            .iter()
            .map(|url| format!("- [{url}]({url})"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// RFC 1123 date, e.g. `Sun, 25 Oct 2026 12:00:00 GMT`.
pub fn format_expiry(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Render the comment body for `entries`, in order.
pub fn render_comment(entries: &[CommentEntry], commit_short_sha: &str) -> String {
    let mut md = format!(
        "Visit the preview URL for this PR (updated for commit {}):\n\n",
        commit_short_sha
    );

    for entry in entries {
        md.push_str(&format!("**{}**\n", entry.package));
        md.push_str(&urls_markdown(&entry.deployment.urls()));
        md.push('\n');
        if let Some(expire_time) = entry.deployment.expire_time() {
            md.push_str(&format!(
                "<sub>(expires {})</sub>\n",
                format_expiry(&expire_time)
            ));
        }
        md.push_str(&format!(
            "<sub>Sign: {}</sub>\n\n",
            derive_signature(&entry.deployment)
        ));
    }

    md.push_str(&format!("<sub>id: {}</sub>", TRACKING_TOKEN));
    md
}
