//! Minimal GitHub REST client: issue comments and check runs.

use std::time::Duration;

use chrono::Utc;
use hostdeploy_core::{CheckDetails, DeployError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Comments are listed in pages of this size.
const PAGE_SIZE: usize = 100;

/// Errors returned by the GitHub REST client.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("invalid github client configuration: {0}")]
    Config(String),

    #[error("github api {operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("github api {operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to decode github {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// `owner/name` coordinates of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(value: &str) -> hostdeploy_core::Result<Self> {
        let mut parts = value.trim().splitn(2, '/');
        let owner = parts.next().unwrap_or_default().trim();
        let name = parts.next().unwrap_or_default().trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(DeployError::InvalidConfig(format!(
                "repository must be 'owner/name', got '{value}'"
            )));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
    /// `User`, `Bot` or `Organization`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<CommentAuthor>,
}

impl IssueComment {
    /// Whether the comment was written by an automation account.
    pub fn is_by_bot(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.kind == "Bot")
    }

    pub fn body_contains(&self, needle: &str) -> bool {
        self.body.as_deref().is_some_and(|body| body.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckRun {
    pub id: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(api_base: &str, token: &str, request_timeout: Duration) -> Result<Self, GithubError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("hostdeploy"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .map_err(|_| GithubError::Config("invalid github authorization header".to_string()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| GithubError::Config(e.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// List every comment on an issue or pull request, oldest first.
    pub async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        issue_number: u64,
    ) -> Result<Vec<IssueComment>, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, repo.owner, repo.name, issue_number
        );
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<IssueComment> = self
                .send_json(
                    "list issue comments",
                    self.http.get(&url).query(&[
                        ("per_page", "100"),
                        ("page", page_value.as_str()),
                    ]),
                )
                .await?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    pub async fn create_issue_comment(
        &self,
        repo: &RepoRef,
        issue_number: u64,
        body: &str,
    ) -> Result<IssueComment, GithubError> {
        self.send_json(
            "create issue comment",
            self.http
                .post(format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.api_base, repo.owner, repo.name, issue_number
                ))
                .json(&json!({ "body": body })),
        )
        .await
    }

    pub async fn update_issue_comment(
        &self,
        repo: &RepoRef,
        comment_id: u64,
        body: &str,
    ) -> Result<IssueComment, GithubError> {
        self.send_json(
            "update issue comment",
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/issues/comments/{}",
                    self.api_base, repo.owner, repo.name, comment_id
                ))
                .json(&json!({ "body": body })),
        )
        .await
    }

    /// Create an in-progress check run on `head_sha`.
    pub async fn create_check_run(
        &self,
        repo: &RepoRef,
        name: &str,
        head_sha: &str,
    ) -> Result<CheckRun, GithubError> {
        self.send_json(
            "create check run",
            self.http
                .post(format!(
                    "{}/repos/{}/{}/check-runs",
                    self.api_base, repo.owner, repo.name
                ))
                .json(&json!({
                    "name": name,
                    "head_sha": head_sha,
                    "status": "in_progress",
                })),
        )
        .await
    }

    /// Mark a check run completed with the given conclusion and output.
    pub async fn complete_check_run(
        &self,
        repo: &RepoRef,
        check_run_id: u64,
        details: &CheckDetails,
    ) -> Result<CheckRun, GithubError> {
        let mut payload = json!({
            "status": "completed",
            "completed_at": Utc::now().to_rfc3339(),
            "conclusion": details.conclusion,
            "output": {
                "title": details.title,
                "summary": details.summary,
            },
        });
        if let Some(url) = &details.details_url {
            payload["details_url"] = json!(url);
        }
        self.send_json(
            "update check run",
            self.http
                .patch(format!(
                    "{}/repos/{}/{}/check-runs/{}",
                    self.api_base, repo.owner, repo.name, check_run_id
                ))
                .json(&payload),
        )
        .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GithubError> {
        let response = request
            .send()
            .await
            .map_err(|source| GithubError::Transport { operation, source })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                operation,
                status: status.as_u16(),
                body: truncate_for_error(&body, 800),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| GithubError::Decode { operation, source })
    }
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
