//! Tracked comment reconciliation.
//!
//! Exactly one comment per pull request carries [`TRACKING_TOKEN`]. Each run
//! replaces that comment's body, or creates it when none can be found or
//! updated. Comment failures are logged and never fail the run: the comment
//! is a notification, the deploys and checks are the record.

use async_trait::async_trait;
use hostdeploy_core::obs::{emit_comment_error, emit_comment_reconciled};
use hostdeploy_core::{render_comment, CommentEntry, TRACKING_TOKEN};
use tracing::info;

use crate::github::{GithubClient, IssueComment, RepoRef};

/// Host commenting API. Each operation may fail independently.
#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list_comments(&self, repo: &RepoRef, pr_number: u64) -> anyhow::Result<Vec<IssueComment>>;

    async fn update_comment(&self, repo: &RepoRef, comment_id: u64, body: &str) -> anyhow::Result<()>;

    /// Returns the id of the new comment.
    async fn create_comment(&self, repo: &RepoRef, pr_number: u64, body: &str) -> anyhow::Result<u64>;
}

#[async_trait]
impl CommentApi for GithubClient {
    async fn list_comments(&self, repo: &RepoRef, pr_number: u64) -> anyhow::Result<Vec<IssueComment>> {
        Ok(self.list_issue_comments(repo, pr_number).await?)
    }

    async fn update_comment(&self, repo: &RepoRef, comment_id: u64, body: &str) -> anyhow::Result<()> {
        self.update_issue_comment(repo, comment_id, body).await?;
        Ok(())
    }

    async fn create_comment(&self, repo: &RepoRef, pr_number: u64, body: &str) -> anyhow::Result<u64> {
        Ok(self.create_issue_comment(repo, pr_number, body).await?.id)
    }
}

/// Which path the reconciler took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Updated { comment_id: u64 },
    Created { comment_id: u64 },
    /// Neither update nor create succeeded.
    Failed,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Updated { .. } => "updated",
            ReconcileOutcome::Created { .. } => "created",
            ReconcileOutcome::Failed => "failed",
        }
    }
}

/// Most recently listed comment written by a bot that carries the token.
pub fn find_tracked_comment(comments: &[IssueComment]) -> Option<&IssueComment> {
    comments
        .iter()
        .rev()
        .find(|comment| comment.is_by_bot() && comment.body_contains(TRACKING_TOKEN))
}

/// Create or update the tracked comment on `pr_number`.
pub async fn reconcile(
    api: &dyn CommentApi,
    repo: &RepoRef,
    pr_number: u64,
    entries: &[CommentEntry],
    commit_short_sha: &str,
) -> ReconcileOutcome {
    let body = render_comment(entries, commit_short_sha);

    let existing = match api.list_comments(repo, pr_number).await {
        Ok(comments) => find_tracked_comment(&comments).map(|comment| comment.id),
        Err(e) => {
            emit_comment_error(pr_number, "list", &e);
            None
        }
    };

    if let Some(comment_id) = existing {
        match api.update_comment(repo, comment_id, &body).await {
            Ok(()) => {
                info!(pr = pr_number, comment_id, "Updated tracked comment");
                let outcome = ReconcileOutcome::Updated { comment_id };
                emit_comment_reconciled(pr_number, outcome.as_str());
                return outcome;
            }
            Err(e) => emit_comment_error(pr_number, "update", &e),
        }
    }

    let outcome = match api.create_comment(repo, pr_number, &body).await {
        Ok(comment_id) => {
            info!(pr = pr_number, comment_id, "Created tracked comment");
            ReconcileOutcome::Created { comment_id }
        }
        Err(e) => {
            emit_comment_error(pr_number, "create", &e);
            ReconcileOutcome::Failed
        }
    };
    emit_comment_reconciled(pr_number, outcome.as_str());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::CommentAuthor;

    fn comment(id: u64, kind: &str, body: &str) -> IssueComment {
        IssueComment {
            id,
            body: Some(body.to_string()),
            user: Some(CommentAuthor {
                login: format!("{}-{}", kind.to_lowercase(), id),
                kind: kind.to_string(),
            }),
        }
    }

    #[test]
    fn test_find_prefers_most_recent_match() {
        let token_body = format!("preview\n<sub>id: {}</sub>", TRACKING_TOKEN);
        let comments = vec![
            comment(1, "Bot", &token_body),
            comment(2, "User", "lgtm"),
            comment(3, "Bot", &token_body),
            comment(4, "Bot", "unrelated bot message"),
        ];
        assert_eq!(find_tracked_comment(&comments).map(|c| c.id), Some(3));
    }

    #[test]
    fn test_find_ignores_humans_quoting_token() {
        let comments = vec![comment(1, "User", TRACKING_TOKEN)];
        assert!(find_tracked_comment(&comments).is_none());
    }

    #[test]
    fn test_find_ignores_comment_without_author() {
        let comments = vec![IssueComment {
            id: 9,
            body: Some(TRACKING_TOKEN.to_string()),
            user: None,
        }];
        assert!(find_tracked_comment(&comments).is_none());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(ReconcileOutcome::Updated { comment_id: 1 }.as_str(), "updated");
        assert_eq!(ReconcileOutcome::Created { comment_id: 1 }.as_str(), "created");
        assert_eq!(ReconcileOutcome::Failed.as_str(), "failed");
    }
}
