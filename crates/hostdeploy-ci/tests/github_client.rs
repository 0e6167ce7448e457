//! GitHub REST client behavior against a mock API server.

use std::sync::Arc;
use std::time::Duration;

use hostdeploy_ci::{
    reconcile, GithubCheckReporter, GithubClient, GithubError, ReconcileOutcome, RepoRef,
    StatusReporter,
};
use hostdeploy_core::{
    CheckDetails, CommentEntry, DeployConfig, DeployFailure, DeployMode, DeploySuccess,
    DeploymentTarget, ProductionDeploy, TRACKING_TOKEN,
};
use httpmock::prelude::*;
use serde_json::json;

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(&server.base_url(), "test-token", Duration::from_secs(5)).expect("client")
}

fn repo() -> RepoRef {
    RepoRef::parse("octo/site").expect("repo")
}

fn production_entry() -> CommentEntry {
    CommentEntry::new(
        "site",
        DeploySuccess::Production(ProductionDeploy {
            hostname: "demo.web.app".to_string(),
            url: "https://demo.web.app/".to_string(),
            raw: String::new(),
        }),
    )
}

#[tokio::test]
async fn test_list_comments_follows_pages() {
    let server = MockServer::start();
    let first_page: Vec<serde_json::Value> = (1..=100)
        .map(|id| json!({ "id": id, "body": "hi", "user": { "login": "octocat", "type": "User" } }))
        .collect();
    let page_one = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/site/issues/5/comments")
            .query_param("per_page", "100")
            .query_param("page", "1")
            .header("authorization", "Bearer test-token");
        then.status(200).json_body(json!(first_page));
    });
    let page_two = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/site/issues/5/comments")
            .query_param("page", "2");
        then.status(200).json_body(json!([
            { "id": 101, "body": null, "user": { "login": "github-actions[bot]", "type": "Bot" } }
        ]));
    });

    let comments = client(&server)
        .list_issue_comments(&repo(), 5)
        .await
        .expect("list");

    page_one.assert_calls(1);
    page_two.assert_calls(1);
    assert_eq!(comments.len(), 101);
    assert!(comments[100].is_by_bot());
    assert!(!comments[100].body_contains("anything"));
}

#[tokio::test]
async fn test_error_status_surfaces_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repos/octo/site/issues/5/comments");
        then.status(403).body("Resource not accessible by integration");
    });

    let err = client(&server)
        .create_issue_comment(&repo(), 5, "hello")
        .await
        .unwrap_err();
    match err {
        GithubError::Status { status, body, .. } => {
            assert_eq!(status, 403);
            assert!(body.contains("not accessible"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconcile_updates_bot_comment_over_http() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/site/issues/9/comments");
        then.status(200).json_body(json!([
            { "id": 11, "body": format!("old\n<sub>id: {}</sub>", TRACKING_TOKEN),
              "user": { "login": "github-actions[bot]", "type": "Bot" } },
            { "id": 12, "body": "nice", "user": { "login": "octocat", "type": "User" } }
        ]));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/octo/site/issues/comments/11")
            .body_includes("updated for commit abc1234")
            .body_includes("demo.web.app");
        then.status(200).json_body(json!({ "id": 11, "body": "new" }));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/repos/octo/site/issues/9/comments");
        then.status(201).json_body(json!({ "id": 99 }));
    });

    let github = client(&server);
    let outcome = reconcile(&github, &repo(), 9, &[production_entry()], "abc1234").await;

    assert_eq!(outcome, ReconcileOutcome::Updated { comment_id: 11 });
    update.assert_calls(1);
    create.assert_calls(0);
}

#[tokio::test]
async fn test_reconcile_creates_when_update_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/site/issues/9/comments");
        then.status(200).json_body(json!([
            { "id": 11, "body": TRACKING_TOKEN, "user": { "login": "other[bot]", "type": "Bot" } }
        ]));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH).path("/repos/octo/site/issues/comments/11");
        then.status(404).body("Not Found");
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/octo/site/issues/9/comments")
            .body_includes(TRACKING_TOKEN);
        then.status(201).json_body(json!({ "id": 42 }));
    });

    let github = client(&server);
    let outcome = reconcile(&github, &repo(), 9, &[production_entry()], "abc1234").await;

    assert_eq!(outcome, ReconcileOutcome::Created { comment_id: 42 });
    update.assert_calls(1);
    create.assert_calls(1);
}

#[tokio::test]
async fn test_check_run_lifecycle() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/octo/site/check-runs")
            .body_includes("\"name\":\"Deploy Preview: admin\"")
            .body_includes("\"head_sha\":\"deadbeef\"")
            .body_includes("\"status\":\"in_progress\"");
        then.status(201).json_body(json!({ "id": 77 }));
    });
    let complete = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/octo/site/check-runs/77")
            .body_includes("\"conclusion\":\"failure\"")
            .body_includes("\"title\":\"Deploy preview failed\"")
            .body_includes("Error: quota exceeded");
        then.status(200).json_body(json!({ "id": 77 }));
    });

    let reporter = GithubCheckReporter::new(Arc::new(client(&server)), repo(), "deadbeef")
        .with_package_names(true);
    let target = DeploymentTarget::new("admin", "packages/admin", DeployConfig::default());

    let check = reporter.begin(&target).await.expect("begin");
    check
        .finish(&CheckDetails::for_failure(
            DeployMode::Preview,
            &DeployFailure::new("quota exceeded", ""),
        ))
        .await
        .expect("finish");

    create.assert_calls(1);
    complete.assert_calls(1);
}

#[tokio::test]
async fn test_check_run_creation_failure_is_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repos/octo/site/check-runs");
        then.status(403).body("forbidden");
    });

    let reporter = GithubCheckReporter::new(Arc::new(client(&server)), repo(), "deadbeef");
    let target = DeploymentTarget::new("site", ".", DeployConfig::default());
    assert!(reporter.begin(&target).await.is_err());
}
