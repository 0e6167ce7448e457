//! Deploy tool invocation.
//!
//! [`FirebaseCli`] runs `firebase-tools` through `npx` in the target's entry
//! point directory and captures its `--json` report. Classification of that
//! report into success or error happens in [`crate::classify`].

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use hostdeploy_core::{DeployError, DeploymentTarget, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

/// Value of `FIREBASE_DEPLOY_AGENT` reported to firebase-tools.
pub const DEPLOY_AGENT: &str = "action-hosting-deploy";

/// Loosely typed deploy tool report: either an `error` or a `result`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawDeployOutput {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub result: Option<serde_json::Value>,

    /// Full stdout the report was parsed from.
    #[serde(skip)]
    pub text: String,
}

impl RawDeployOutput {
    /// Parse the JSON report from deploy tool stdout.
    ///
    /// The report is the last JSON object in the output; anything printed
    /// before it (npx install chatter, warnings) is ignored.
    pub fn parse(stdout: &str) -> Option<Self> {
        let trimmed = stdout.trim();
        if let Ok(mut parsed) = serde_json::from_str::<RawDeployOutput>(trimmed) {
            parsed.text = stdout.to_string();
            return Some(parsed);
        }

        let mut line_starts: Vec<usize> = trimmed
            .match_indices('\n')
            .map(|(idx, _)| idx + 1)
            .collect();
        line_starts.insert(0, 0);
        line_starts
            .into_iter()
            .rev()
            .filter(|start| trimmed[*start..].starts_with('{'))
            .find_map(|start| serde_json::from_str::<RawDeployOutput>(&trimmed[start..]).ok())
            .map(|mut parsed| {
                parsed.text = stdout.to_string();
                parsed
            })
    }

    pub fn from_error(message: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            status: Some("error".to_string()),
            error: Some(message.into()),
            result: None,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.status.as_deref() == Some("error")
    }
}

/// The external deploy operation, one call per target.
#[async_trait]
pub trait DeployInvoker: Send + Sync {
    async fn deploy_preview(
        &self,
        credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput>;

    async fn deploy_production(
        &self,
        credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput>;
}

/// Runs `npx firebase-tools@<version>`.
#[derive(Debug, Clone)]
pub struct FirebaseCli {
    /// Program and leading arguments placed before `firebase-tools@<version>`.
    launcher: Vec<String>,
}

impl Default for FirebaseCli {
    fn default() -> Self {
        Self {
            launcher: vec!["npx".to_string(), "--yes".to_string()],
        }
    }
}

impl FirebaseCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different launcher than `npx --yes`.
    pub fn with_launcher(launcher: Vec<String>) -> Self {
        Self { launcher }
    }

    /// Arguments for `hosting:channel:deploy`.
    pub fn preview_args(target: &DeploymentTarget) -> Vec<String> {
        let config = &target.config;
        let mut args = vec![
            "hosting:channel:deploy".to_string(),
            config.channel_id.clone().unwrap_or_default(),
        ];
        if let Some(site) = &config.site_target {
            args.push("--only".to_string());
            args.push(site.clone());
        }
        if let Some(expires) = &config.expires {
            args.push("--expires".to_string());
            args.push(expires.clone());
        }
        args
    }

    /// Arguments for a live `deploy --only hosting[:<target>]`.
    pub fn production_args(target: &DeploymentTarget) -> Vec<String> {
        let only = match &target.config.site_target {
            Some(site) => format!("hosting:{site}"),
            None => "hosting".to_string(),
        };
        vec!["deploy".to_string(), "--only".to_string(), only]
    }

    /// Full command line, launcher included.
    pub fn command_line(&self, target: &DeploymentTarget, args: Vec<String>) -> Vec<String> {
        let mut command = self.launcher.clone();
        command.push(format!("firebase-tools@{}", target.config.tool_version));
        command.extend(args);
        if let Some(project) = &target.config.project_id {
            command.push("--project".to_string());
            command.push(project.clone());
        }
        command.push("--json".to_string());
        command
    }

    async fn exec(
        &self,
        credentials: &Path,
        target: &DeploymentTarget,
        args: Vec<String>,
    ) -> Result<RawDeployOutput> {
        let start = Instant::now();
        let command = self.command_line(target, args);
        let (exe, rest) = command
            .split_first()
            .ok_or_else(|| DeployError::Invocation("empty launcher command".to_string()))?;

        debug!(target = %target.name, command = ?command, "Spawning deploy tool");
        let output = Command::new(exe)
            .args(rest)
            .current_dir(&target.entry_point)
            .env("GOOGLE_APPLICATION_CREDENTIALS", credentials)
            .env("FIREBASE_DEPLOY_AGENT", DEPLOY_AGENT)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                DeployError::Invocation(format!(
                    "failed to run {} in {}: {}",
                    exe, target.entry_point, e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(
            target = %target.name,
            exit_code = output.status.code().unwrap_or(-1),
            duration_ms = start.elapsed().as_millis() as u64,
            "Deploy tool exited"
        );

        match RawDeployOutput::parse(&stdout) {
            Some(parsed) => Ok(parsed),
            None if !output.status.success() => Err(DeployError::Invocation(format!(
                "firebase-tools exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                last_lines(&stderr, 5)
            ))),
            None => Err(DeployError::UnexpectedOutput(format!(
                "no JSON report in firebase-tools output: {}",
                last_lines(&stdout, 5)
            ))),
        }
    }
}

#[async_trait]
impl DeployInvoker for FirebaseCli {
    async fn deploy_preview(
        &self,
        credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput> {
        self.exec(credentials, target, Self::preview_args(target)).await
    }

    async fn deploy_production(
        &self,
        credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput> {
        self.exec(credentials, target, Self::production_args(target)).await
    }
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(count)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdeploy_core::DeployConfig;

    fn target() -> DeploymentTarget {
        DeploymentTarget::new(
            "app",
            ".",
            DeployConfig {
                project_id: Some("demo".to_string()),
                site_target: Some("docs".to_string()),
                channel_id: Some("pr5-login".to_string()),
                expires: Some("7d".to_string()),
                tool_version: "13.0.0".to_string(),
            },
        )
    }

    #[test]
    fn test_preview_command_line() {
        let t = target();
        let command = FirebaseCli::new().command_line(&t, FirebaseCli::preview_args(&t));
        assert_eq!(
            command,
            vec![
                "npx", "--yes", "firebase-tools@13.0.0", "hosting:channel:deploy", "pr5-login",
                "--only", "docs", "--expires", "7d", "--project", "demo", "--json",
            ]
        );
    }

    #[test]
    fn test_production_command_line() {
        let mut t = target();
        t.config.site_target = None;
        t.config.project_id = None;
        let command = FirebaseCli::new().command_line(&t, FirebaseCli::production_args(&t));
        assert_eq!(
            command,
            vec!["npx", "--yes", "firebase-tools@13.0.0", "deploy", "--only", "hosting", "--json"]
        );
    }

    #[test]
    fn test_production_args_with_target() {
        assert_eq!(
            FirebaseCli::production_args(&target()),
            vec!["deploy", "--only", "hosting:docs"]
        );
    }

    #[test]
    fn test_parse_plain_report() {
        let parsed = RawDeployOutput::parse(r#"{"status":"error","error":"quota exceeded"}"#)
            .expect("report");
        assert!(parsed.is_error());
        assert_eq!(parsed.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_parse_report_after_noise() {
        let stdout = "npm WARN exec The following package was not found\n{\n  \"status\": \"success\",\n  \"result\": {}\n}\n";
        let parsed = RawDeployOutput::parse(stdout).expect("report");
        assert!(!parsed.is_error());
        assert_eq!(parsed.status.as_deref(), Some("success"));
        assert_eq!(parsed.text, stdout);
    }

    #[test]
    fn test_parse_without_json() {
        assert!(RawDeployOutput::parse("Error: command not found").is_none());
        assert!(RawDeployOutput::parse("").is_none());
    }

    #[test]
    fn test_last_lines() {
        assert_eq!(last_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(last_lines("only", 5), "only");
    }

    #[tokio::test]
    async fn test_exec_reads_report_from_launcher() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("fake-firebase.sh");
        std::fs::write(
            &script,
            "echo \"args: $@\"\necho '{\"status\":\"success\",\"result\":{\"hosting\":\"sites/demo\"}}'\n",
        )
        .expect("write script");

        let cli = FirebaseCli::with_launcher(vec![
            "sh".to_string(),
            script.to_string_lossy().to_string(),
        ]);
        let mut t = target();
        t.entry_point = dir.path().to_string_lossy().to_string();

        let output = cli
            .deploy_production(Path::new("/tmp/creds.json"), &t)
            .await
            .expect("invoke");
        assert_eq!(output.status.as_deref(), Some("success"));
        assert!(output.text.contains("args: firebase-tools@13.0.0 deploy --only hosting:docs"));
    }

    #[tokio::test]
    async fn test_exec_failure_without_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = FirebaseCli::with_launcher(vec!["false".to_string()]);
        let mut t = target();
        t.entry_point = dir.path().to_string_lossy().to_string();

        let err = cli
            .deploy_preview(Path::new("/tmp/creds.json"), &t)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Invocation(_)));
    }

    #[tokio::test]
    async fn test_exec_missing_entry_point() {
        let mut t = target();
        t.entry_point = "/definitely/not/a/dir".to_string();
        let err = FirebaseCli::with_launcher(vec!["true".to_string()])
            .deploy_preview(Path::new("/tmp/creds.json"), &t)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/a/dir"));
    }
}
