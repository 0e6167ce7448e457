//! Action inputs and the immutable configuration built from them.

use std::path::PathBuf;

use clap::Args;
use hostdeploy_core::{DeployConfig, DeployError, DeployMode, DeploymentTarget, Result};

/// Placeholder substituted with each package name in `entryPointTemplate`.
pub const ENTRY_POINT_PLACEHOLDER: &str = "$ENTRY_POINT";

/// Raw action inputs. Every input can also come from its `INPUT_*` variable
/// as set by the Actions runner; empty values count as unset.
#[derive(Args, Debug, Clone, Default)]
pub struct ActionInputs {
    /// Firebase project to deploy to
    #[arg(long, env = "INPUT_PROJECTID")]
    pub project_id: Option<String>,

    /// Service account JSON, or a path to a credentials file
    #[arg(long, env = "INPUT_FIREBASESERVICEACCOUNT", hide_env_values = true)]
    pub firebase_service_account: Option<String>,

    /// Preview channel id; `live` deploys to production
    #[arg(long, env = "INPUT_CHANNELID")]
    pub channel_id: Option<String>,

    /// Directory containing firebase.json
    #[arg(long, env = "INPUT_ENTRYPOINT")]
    pub entry_point: Option<String>,

    /// Hosting target (site) to deploy
    #[arg(long, env = "INPUT_TARGET")]
    pub target: Option<String>,

    /// Preview channel lifetime, e.g. `7d`
    #[arg(long, env = "INPUT_EXPIRES")]
    pub expires: Option<String>,

    /// firebase-tools version to run
    #[arg(long, env = "INPUT_FIREBASETOOLSVERSION")]
    pub firebase_tools_version: Option<String>,

    /// Token for check runs and pull request comments
    #[arg(long, env = "INPUT_REPOTOKEN", hide_env_values = true)]
    pub repo_token: Option<String>,

    /// Workflow token; preferred over `--repo-token` when both are set
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// JSON array of package names deployed side by side
    #[arg(long, env = "INPUT_PACKAGES")]
    pub packages: Option<String>,

    /// Entry point per package, with `$ENTRY_POINT` replaced by the package
    #[arg(long, env = "INPUT_ENTRYPOINTTEMPLATE")]
    pub entry_point_template: Option<String>,

    /// Command used to launch firebase-tools instead of `npx --yes`
    #[arg(long, env = "HOSTDEPLOY_FIREBASE_LAUNCHER")]
    pub firebase_launcher: Option<String>,

    /// File that receives step outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,
}

/// Validated configuration for one action run.
#[derive(Debug, Clone)]
pub struct ActionConfig {
    pub service_account: String,
    /// Channel id as configured, before derivation from the pull request.
    pub channel_id: Option<String>,
    pub project_id: Option<String>,
    pub site_target: Option<String>,
    pub expires: Option<String>,
    pub tool_version: String,
    pub token: Option<String>,
    pub entry_point: String,
    /// Package names from the `packages` input, in input order.
    pub packages: Option<Vec<String>>,
    pub entry_point_template: String,
    pub launcher: Option<Vec<String>>,
    pub output_file: Option<PathBuf>,
}

impl ActionConfig {
    pub fn from_inputs(inputs: ActionInputs) -> Result<Self> {
        let service_account = non_empty(inputs.firebase_service_account).ok_or_else(|| {
            DeployError::CredentialSetup("firebaseServiceAccount is required".to_string())
        })?;

        let packages = match non_empty(inputs.packages) {
            Some(raw) => Some(parse_packages(&raw)?),
            None => None,
        };

        let launcher = non_empty(inputs.firebase_launcher)
            .map(|raw| raw.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());

        let config = Self {
            service_account,
            channel_id: non_empty(inputs.channel_id),
            project_id: non_empty(inputs.project_id),
            site_target: non_empty(inputs.target),
            expires: non_empty(inputs.expires),
            tool_version: non_empty(inputs.firebase_tools_version)
                .unwrap_or_else(|| "latest".to_string()),
            token: non_empty(inputs.github_token).or(non_empty(inputs.repo_token)),
            entry_point: non_empty(inputs.entry_point).unwrap_or_else(|| ".".to_string()),
            packages,
            entry_point_template: non_empty(inputs.entry_point_template)
                .unwrap_or_else(|| ENTRY_POINT_PLACEHOLDER.to_string()),
            launcher,
            output_file: inputs.output_file.filter(|path| !path.as_os_str().is_empty()),
        };

        if config.mode() == DeployMode::Production
            && config.project_id.is_none()
            && config.site_target.is_none()
        {
            return Err(DeployError::InvalidConfig(
                "production deploys need projectId or target to determine the live URL".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn mode(&self) -> DeployMode {
        DeployMode::from_channel_id(self.channel_id.as_deref())
    }

    /// Per-target deploy settings for the resolved channel.
    pub fn deploy_config(&self, channel_id: String) -> DeployConfig {
        DeployConfig {
            project_id: self.project_id.clone(),
            site_target: self.site_target.clone(),
            channel_id: Some(channel_id),
            expires: self.expires.clone(),
            tool_version: self.tool_version.clone(),
        }
    }

    /// One target per package, or the single entry point.
    pub fn targets(&self, channel_id: String) -> Vec<DeploymentTarget> {
        let deploy = self.deploy_config(channel_id);
        match &self.packages {
            Some(packages) => packages
                .iter()
                .map(|package| {
                    let entry_point = self
                        .entry_point_template
                        .replacen(ENTRY_POINT_PLACEHOLDER, package, 1);
                    DeploymentTarget::new(package.clone(), entry_point, deploy.clone())
                })
                .collect(),
            None => vec![DeploymentTarget::new(
                self.entry_point.clone(),
                self.entry_point.clone(),
                deploy,
            )],
        }
    }
}

/// Parse the `packages` input: a JSON array of non-empty strings.
pub fn parse_packages(raw: &str) -> Result<Vec<String>> {
    let packages: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| DeployError::InvalidPackages(format!("expected a JSON array of strings: {e}")))?;
    if let Some(position) = packages.iter().position(|p| p.trim().is_empty()) {
        return Err(DeployError::InvalidPackages(format!(
            "package at index {position} is empty"
        )));
    }
    Ok(packages)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
