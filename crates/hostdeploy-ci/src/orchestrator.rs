//! Concurrent deploy orchestration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use hostdeploy_core::obs::{
    emit_check_error, emit_deploy_finished, emit_deploy_started, emit_run_finished,
    emit_run_started, target_span,
};
use hostdeploy_core::{
    CheckDetails, CommentEntry, DeployFailure, DeployMode, DeploySuccess, DeploymentResult,
    DeploymentTarget,
};
use tracing::{info, warn, Instrument};

use crate::classify::classify;
use crate::invoker::DeployInvoker;
use crate::status::{LogStatusReporter, StatusCheck, StatusReporter};

/// Settled result of one target.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: DeploymentTarget,
    pub result: DeploymentResult,
    pub duration_ms: u64,
}

/// Result of a complete orchestrator run, one outcome per target in input
/// order.
#[derive(Debug, Clone)]
pub struct DeployRun {
    pub mode: DeployMode,
    pub outcomes: Vec<TargetOutcome>,
    pub duration_ms: u64,
}

impl DeployRun {
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.result.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn results(&self) -> Vec<&DeploymentResult> {
        self.outcomes.iter().map(|o| &o.result).collect()
    }

    /// First successful target in input order; feeds the legacy outputs.
    pub fn first_success(&self) -> Option<&DeploySuccess> {
        self.outcomes.iter().find_map(|o| o.result.success())
    }

    /// Comment sections for the successful subset, in input order.
    pub fn comment_entries(&self) -> Vec<CommentEntry> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.result
                    .success()
                    .map(|success| CommentEntry::new(o.target.name.clone(), success.clone()))
            })
            .collect()
    }

    /// `(package, message)` for every failed target.
    pub fn failures(&self) -> Vec<(&str, &DeployFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.failure().map(|f| (o.target.name.as_str(), f)))
            .collect()
    }
}

/// Deploy orchestrator: fans out one task per target and joins them all.
pub struct DeployOrchestrator {
    invoker: Arc<dyn DeployInvoker>,
    reporter: Arc<dyn StatusReporter>,
    credentials: PathBuf,
}

impl DeployOrchestrator {
    /// Without a reporter, check details are only logged.
    pub fn new(
        invoker: Arc<dyn DeployInvoker>,
        credentials: impl Into<PathBuf>,
        reporter: Option<Arc<dyn StatusReporter>>,
    ) -> Self {
        Self {
            invoker,
            reporter: reporter.unwrap_or_else(|| Arc::new(LogStatusReporter)),
            credentials: credentials.into(),
        }
    }

    /// Deploy every target concurrently and wait for all of them.
    ///
    /// A failing or panicking target never affects its siblings: its error
    /// lands in its own slot of the returned run.
    pub async fn run(&self, targets: Vec<DeploymentTarget>, mode: DeployMode) -> DeployRun {
        let start = Instant::now();
        emit_run_started(mode, targets.len());

        let handles: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let invoker = Arc::clone(&self.invoker);
                let reporter = Arc::clone(&self.reporter);
                let credentials = self.credentials.clone();
                let span = target_span(&target.name);
                tokio::spawn(
                    async move { deploy_target(invoker, reporter, credentials, target, mode).await }
                        .instrument(span),
                )
            })
            .collect();

        let settled = futures::future::join_all(handles).await;

        let outcomes: Vec<TargetOutcome> = targets
            .into_iter()
            .zip(settled)
            .map(|(target, joined)| match joined {
                Ok((result, duration_ms)) => TargetOutcome {
                    target,
                    result,
                    duration_ms,
                },
                Err(e) => {
                    warn!(target = %target.name, error = %e, "Deploy task did not complete");
                    TargetOutcome {
                        result: DeploymentResult::Error(DeployFailure::new(
                            format!("deploy task for '{}' aborted: {}", target.name, e),
                            "",
                        )),
                        target,
                        duration_ms: 0,
                    }
                }
            })
            .collect();

        let run = DeployRun {
            mode,
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        emit_run_finished(run.duration_ms, run.passed_count(), run.failed_count());
        run
    }
}

async fn deploy_target(
    invoker: Arc<dyn DeployInvoker>,
    reporter: Arc<dyn StatusReporter>,
    credentials: PathBuf,
    target: DeploymentTarget,
    mode: DeployMode,
) -> (DeploymentResult, u64) {
    let start = Instant::now();

    let check: Option<Box<dyn StatusCheck>> = match reporter.begin(&target).await {
        Ok(check) => Some(check),
        Err(e) => {
            emit_check_error(&target.name, "create", &e);
            None
        }
    };

    emit_deploy_started(&target.name, mode);
    // Invoke in a child task so a panic still reaches the check below.
    let deploy = {
        let target = target.clone();
        tokio::spawn(
            async move {
                let invoked = match mode {
                    DeployMode::Preview => invoker.deploy_preview(&credentials, &target).await,
                    DeployMode::Production => {
                        invoker.deploy_production(&credentials, &target).await
                    }
                };
                match invoked {
                    Ok(raw) => classify(mode, &target, raw),
                    Err(e) => DeploymentResult::Error(DeployFailure::new(e.to_string(), "")),
                }
            }
            .in_current_span(),
        )
    };
    let result = match deploy.await {
        Ok(result) => result,
        Err(e) => DeploymentResult::Error(DeployFailure::new(
            format!("deploy task for '{}' aborted: {}", target.name, e),
            "",
        )),
    };

    let details = match &result {
        DeploymentResult::Success(success) => {
            info!(urls = ?success.urls(), "Deploy succeeded");
            CheckDetails::for_success(success)
        }
        DeploymentResult::Error(failure) => {
            warn!(error = %failure.message, "Deploy failed");
            CheckDetails::for_failure(mode, failure)
        }
    };

    if let Some(check) = check {
        if let Err(e) = check.finish(&details).await {
            emit_check_error(&target.name, "finish", &e);
        }
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    emit_deploy_finished(&target.name, result.is_success(), duration_ms);
    (result, duration_ms)
}
