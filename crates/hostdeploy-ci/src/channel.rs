//! Preview channel id resolution.

use std::sync::OnceLock;

use hostdeploy_core::{DeployError, Result};
use regex::Regex;
use tracing::info;

use crate::context::PullRequestContext;

/// Characters of the head branch kept in a derived channel id.
const BRANCH_PREFIX_CHARS: usize = 20;

fn invalid_channel_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_.\-]").expect("channel id pattern is valid"))
}

/// Resolve the preview channel id.
///
/// A configured id wins. Otherwise pull requests get
/// `pr<number>-<first 20 chars of head ref>`. Channel ids may only contain
/// letters, digits, `_`, `-` and `.`; anything else becomes `_`.
pub fn resolve_channel_id(
    configured: Option<&str>,
    pull_request: Option<&PullRequestContext>,
) -> Result<String> {
    let raw = match (configured, pull_request) {
        (Some(id), _) if !id.trim().is_empty() => id.trim().to_string(),
        (_, Some(pr)) => {
            let branch: String = pr.head_ref.chars().take(BRANCH_PREFIX_CHARS).collect();
            format!("pr{}-{}", pr.number, branch)
        }
        _ => {
            return Err(DeployError::InvalidConfig(
                "channelId is required when not running on a pull request".to_string(),
            ))
        }
    };

    let corrected = invalid_channel_chars().replace_all(&raw, "_").into_owned();
    if corrected != raw {
        info!(
            requested = %raw,
            corrected = %corrected,
            "ChannelId contained invalid characters, replaced them with '_'"
        );
    }
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(number: u64, head_ref: &str) -> PullRequestContext {
        PullRequestContext {
            number,
            head_sha: "0123456789".to_string(),
            head_ref: head_ref.to_string(),
        }
    }

    #[test]
    fn test_configured_channel_wins() {
        let id = resolve_channel_id(Some("staging"), Some(&pr(5, "feature"))).expect("resolve");
        assert_eq!(id, "staging");
    }

    #[test]
    fn test_derived_from_pull_request() {
        let id = resolve_channel_id(None, Some(&pr(5, "fix-login"))).expect("resolve");
        assert_eq!(id, "pr5-fix-login");
    }

    #[test]
    fn test_branch_truncated_to_twenty_chars() {
        let id = resolve_channel_id(None, Some(&pr(12, "abcdefghijklmnopqrstuvwxyz"))).expect("resolve");
        assert_eq!(id, "pr12-abcdefghijklmnopqrst");
    }

    #[test]
    fn test_invalid_characters_replaced() {
        let id = resolve_channel_id(None, Some(&pr(7, "feature/new ui"))).expect("resolve");
        assert_eq!(id, "pr7-feature_new_ui");

        let id = resolve_channel_id(Some("my channel!"), None).expect("resolve");
        assert_eq!(id, "my_channel_");
    }

    #[test]
    fn test_empty_configured_falls_back_to_pull_request() {
        let id = resolve_channel_id(Some("  "), Some(&pr(3, "main"))).expect("resolve");
        assert_eq!(id, "pr3-main");
    }

    #[test]
    fn test_missing_channel_outside_pull_request() {
        assert!(resolve_channel_id(None, None).is_err());
    }
}
