//! hostdeploy - Firebase Hosting deploys from GitHub Actions
//!
//! Deploys one or more packages to a preview channel (or to the live site
//! when the channel is `live`), reports one check run per package and keeps
//! a single up-to-date comment on the pull request.
//!
//! All inputs are read from the `INPUT_*` variables the Actions runner sets,
//! so the binary runs without arguments inside a workflow.

mod action;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use hostdeploy_ci::workflow::error_annotation;
use hostdeploy_ci::ActionContext;
use tracing::{error, info, Level};

use crate::action::run_action;
use crate::config::{ActionConfig, ActionInputs};

#[derive(Parser)]
#[command(name = "hostdeploy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deploy Firebase Hosting previews and production from GitHub Actions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    inputs: ActionInputs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    hostdeploy_core::init_tracing(cli.json, level);

    match execute(cli.inputs).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = ?e, "Action failed");
            error_annotation(None, &format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when at least one target failed to deploy.
async fn execute(inputs: ActionInputs) -> Result<bool> {
    let config = ActionConfig::from_inputs(inputs).context("Invalid action inputs")?;
    let ctx = ActionContext::from_env().context("Failed to read the GitHub Actions context")?;

    let run = run_action(&config, &ctx).await?;
    info!(
        mode = run.mode.as_str(),
        succeeded = run.passed_count(),
        failed = run.failed_count(),
        duration_ms = run.duration_ms,
        "Deploy run complete"
    );
    Ok(run.all_succeeded())
}
