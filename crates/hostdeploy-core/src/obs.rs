//! Structured observability hooks for deploy lifecycle events.
//!
//! Events are emitted at `info!` level (`warn!` for swallowed failures) and
//! carry an `event` field so they can be filtered in JSON log output.

use tracing::{info, warn};

use crate::domain::DeployMode;

/// Span tagging every log line of one target's deploy task.
///
/// ```ignore
/// deploy_one(target).instrument(target_span("app")).await
/// ```
pub fn target_span(target: &str) -> tracing::Span {
    tracing::info_span!("hostdeploy.target", target = %target)
}

pub fn emit_run_started(mode: DeployMode, target_count: usize) {
    info!(event = "run.started", mode = mode.as_str(), targets = target_count);
}

pub fn emit_run_finished(duration_ms: u64, succeeded: usize, failed: usize) {
    info!(
        event = "run.finished",
        duration_ms = duration_ms,
        succeeded = succeeded,
        failed = failed,
    );
}

pub fn emit_deploy_started(target: &str, mode: DeployMode) {
    info!(event = "deploy.started", target = %target, mode = mode.as_str());
}

pub fn emit_deploy_finished(target: &str, success: bool, duration_ms: u64) {
    info!(
        event = "deploy.finished",
        target = %target,
        success = success,
        duration_ms = duration_ms,
    );
}

/// Status check create/finish failed; the deploy itself continues.
pub fn emit_check_error(target: &str, stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "check.error", target = %target, stage = %stage, error = %error);
}

/// `action` is one of `updated`, `created` or `failed`.
pub fn emit_comment_reconciled(pr_number: u64, action: &str) {
    info!(event = "comment.reconciled", pr = pr_number, action = %action);
}

pub fn emit_comment_error(pr_number: u64, operation: &str, error: &dyn std::fmt::Display) {
    warn!(event = "comment.error", pr = pr_number, operation = %operation, error = %error);
}
