//! One action run: credentials, concurrent deploys, outputs, PR comment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hostdeploy_ci::workflow::{end_group, error_annotation, start_group};
use hostdeploy_ci::{
    materialize, reconcile, resolve_channel_id, ActionContext, ActionOutputs, DeployOrchestrator,
    DeployRun, FirebaseCli, GithubCheckReporter, GithubClient, StatusReporter,
};
use hostdeploy_core::{DeployMode, LIVE_CHANNEL};
use tracing::{info, warn};

use crate::config::ActionConfig;

const GITHUB_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute the action. Returns the settled run; per-target failures are in
/// the run, only setup errors are returned as `Err`.
pub async fn run_action(config: &ActionConfig, ctx: &ActionContext) -> Result<DeployRun> {
    start_group("Setting up CLI credentials");
    let credentials =
        materialize(&config.service_account).context("Failed to set up deploy credentials")?;
    end_group();

    let mode = config.mode();
    let channel_id = match mode {
        DeployMode::Production => LIVE_CHANNEL.to_string(),
        DeployMode::Preview => resolve_channel_id(
            config.channel_id.as_deref(),
            ctx.pull_request.as_ref(),
        )
        .context("Failed to determine preview channel")?,
    };
    let targets = config.targets(channel_id.clone());

    let github = match &config.token {
        Some(token) => Some(Arc::new(
            GithubClient::new(&ctx.api_url, token, GITHUB_REQUEST_TIMEOUT)
                .context("Failed to create GitHub client")?,
        )),
        None => None,
    };

    let reporter: Option<Arc<dyn StatusReporter>> =
        match (&github, &ctx.repo, &ctx.pull_request) {
            (Some(client), Some(repo), Some(pr)) => Some(Arc::new(
                GithubCheckReporter::new(Arc::clone(client), repo.clone(), pr.head_sha.clone())
                    .with_package_names(targets.len() > 1),
            ) as Arc<dyn StatusReporter>),
            _ => None,
        };

    let invoker = match &config.launcher {
        Some(launcher) => FirebaseCli::with_launcher(launcher.clone()),
        None => FirebaseCli::new(),
    };
    let orchestrator = DeployOrchestrator::new(
        Arc::new(invoker),
        credentials.path().to_path_buf(),
        reporter,
    );

    start_group(&match mode {
        DeployMode::Production => format!("Deploying {} target(s) to production", targets.len()),
        DeployMode::Preview => format!(
            "Deploying {} target(s) to preview channel {}",
            targets.len(),
            channel_id
        ),
    });
    let run = orchestrator.run(targets, mode).await;
    end_group();
    drop(credentials);

    if let Some(success) = run.first_success() {
        let outputs = ActionOutputs::from_success(success);
        match &config.output_file {
            Some(path) => {
                if let Err(e) = outputs.write_to(path) {
                    warn!(path = %path.display(), error = %e, "Failed to write step outputs");
                }
            }
            None => info!(urls = ?outputs.urls, "No output file configured; skipping outputs"),
        }
    }

    match (&github, &ctx.repo, &ctx.pull_request) {
        (Some(client), Some(repo), Some(pr)) if run.passed_count() > 0 => {
            let outcome = reconcile(
                &**client,
                repo,
                pr.number,
                &run.comment_entries(),
                pr.short_sha(),
            )
            .await;
            info!(pr = pr.number, outcome = outcome.as_str(), "Comment reconciliation finished");
        }
        (Some(_), Some(_), Some(pr)) => {
            info!(pr = pr.number, "No successful deploys; leaving the PR comment untouched")
        }
        _ => info!("Not a pull request run with a token; skipping PR comment"),
    }

    for (package, failure) in run.failures() {
        warn!(package = %package, error = %failure.message, "Deploy failed");
        error_annotation(Some(&format!("Deploy failed: {package}")), &failure.message);
    }

    Ok(run)
}
