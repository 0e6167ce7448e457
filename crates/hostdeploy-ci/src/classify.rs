//! Classification of raw deploy tool reports into typed results.

use chrono::{DateTime, Utc};
use hostdeploy_core::{
    ChannelDeploy, DeployFailure, DeployMode, DeploySuccess, DeploymentResult, DeploymentTarget,
    ProductionDeploy,
};
use serde::Deserialize;
use serde_json::Value;

use crate::invoker::RawDeployOutput;

/// Per-site entry of a `hosting:channel:deploy --json` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteDeploy {
    url: String,
    expire_time: DateTime<Utc>,
}

/// Classify one report.
///
/// Rule:
/// - An `error` field or `status == "error"` makes it an error
/// - Otherwise the shape depends on `mode`: preview reports must list at
///   least one site with a URL and expiry; production success is derived
///   from the configured project or site target
pub fn classify(mode: DeployMode, target: &DeploymentTarget, raw: RawDeployOutput) -> DeploymentResult {
    if raw.is_error() {
        let message = raw
            .error
            .clone()
            .unwrap_or_else(|| "deploy failed without an error message".to_string());
        return DeploymentResult::Error(DeployFailure::new(message, raw.text));
    }

    let classified = match mode {
        DeployMode::Preview => classify_channel(target, &raw),
        DeployMode::Production => classify_production(target, &raw),
    };
    match classified {
        Ok(success) => DeploymentResult::Success(success),
        Err(message) => DeploymentResult::Error(DeployFailure::new(message, raw.text)),
    }
}

fn classify_channel(target: &DeploymentTarget, raw: &RawDeployOutput) -> Result<DeploySuccess, String> {
    let result = raw
        .result
        .clone()
        .ok_or_else(|| "deploy report has no result".to_string())?;
    let Value::Object(sites) = result else {
        return Err("unexpected channel deploy result: expected an object of sites".to_string());
    };

    // Site order follows the report; the first site drives details_url and expiry.
    let sites = sites
        .into_iter()
        .map(|(site, value)| {
            serde_json::from_value::<SiteDeploy>(value)
                .map_err(|e| format!("unexpected channel deploy result for site '{site}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let expire_time = sites
        .first()
        .map(|site| site.expire_time)
        .ok_or_else(|| "channel deploy result lists no sites".to_string())?;
    let urls = sites.into_iter().map(|site| site.url).collect();

    Ok(DeploySuccess::Channel(ChannelDeploy {
        channel_id: target.config.channel_id.clone().unwrap_or_default(),
        urls,
        expire_time,
        raw: raw.text.clone(),
    }))
}

fn classify_production(target: &DeploymentTarget, raw: &RawDeployOutput) -> Result<DeploySuccess, String> {
    let hostname = target
        .config
        .production_hostname()
        .ok_or_else(|| "cannot determine live hostname: set projectId or target".to_string())?;
    Ok(DeploySuccess::Production(ProductionDeploy {
        url: format!("https://{hostname}/"),
        hostname,
        raw: raw.text.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdeploy_core::DeployConfig;
    use serde_json::json;

    fn target(project: Option<&str>, site: Option<&str>) -> DeploymentTarget {
        DeploymentTarget::new(
            "app",
            ".",
            DeployConfig {
                project_id: project.map(str::to_string),
                site_target: site.map(str::to_string),
                channel_id: Some("pr-5".to_string()),
                ..DeployConfig::default()
            },
        )
    }

    fn raw(value: serde_json::Value) -> RawDeployOutput {
        let mut parsed: RawDeployOutput = serde_json::from_value(value.clone()).expect("raw");
        parsed.text = value.to_string();
        parsed
    }

    #[test]
    fn test_error_field_marks_error() {
        let result = classify(
            DeployMode::Preview,
            &target(Some("demo"), None),
            raw(json!({ "status": "error", "error": "quota exceeded" })),
        );
        assert_eq!(
            result.failure().map(|f| f.message.as_str()),
            Some("quota exceeded")
        );
    }

    #[test]
    fn test_error_status_without_message() {
        let result = classify(
            DeployMode::Production,
            &target(Some("demo"), None),
            raw(json!({ "status": "error" })),
        );
        assert!(!result.is_success());
    }

    #[test]
    fn test_channel_success() {
        let result = classify(
            DeployMode::Preview,
            &target(Some("demo"), None),
            raw(json!({
                "status": "success",
                "result": {
                    "demo": {
                        "site": "demo",
                        "url": "https://x--pr-5.web.app",
                        "expireTime": "2026-10-25T12:00:00.000Z"
                    }
                }
            })),
        );
        match result.success() {
            Some(DeploySuccess::Channel(channel)) => {
                assert_eq!(channel.channel_id, "pr-5");
                assert_eq!(channel.urls, vec!["https://x--pr-5.web.app"]);
                assert_eq!(channel.expire_time.to_rfc3339(), "2026-10-25T12:00:00+00:00");
                assert!(channel.raw.contains("success"));
            }
            other => panic!("expected channel success, got {other:?}"),
        }
    }

    #[test]
    fn test_channel_success_multiple_sites_keep_report_order() {
        let stdout = r#"{"status":"success","result":{"blog":{"site":"blog","url":"https://blog--pr-5.web.app","expireTime":"2026-10-25T12:00:00Z"},"app":{"site":"app","url":"https://app--pr-5.web.app","expireTime":"2026-10-30T12:00:00Z"}}}"#;
        let parsed = RawDeployOutput::parse(stdout).expect("report");
        let result = classify(DeployMode::Preview, &target(Some("demo"), None), parsed);

        let success = result.success().expect("success");
        assert_eq!(
            success.urls(),
            vec!["https://blog--pr-5.web.app", "https://app--pr-5.web.app"]
        );
        assert_eq!(success.details_url(), Some("https://blog--pr-5.web.app"));
        assert_eq!(
            success.expire_time().map(|t| t.to_rfc3339()),
            Some("2026-10-25T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_channel_result_not_object_is_error() {
        let result = classify(
            DeployMode::Preview,
            &target(Some("demo"), None),
            raw(json!({ "status": "success", "result": ["https://x.web.app"] })),
        );
        assert!(result.failure().unwrap().message.contains("object of sites"));
    }

    #[test]
    fn test_channel_without_sites_is_error() {
        let result = classify(
            DeployMode::Preview,
            &target(Some("demo"), None),
            raw(json!({ "status": "success", "result": {} })),
        );
        assert!(result.failure().unwrap().message.contains("no sites"));
    }

    #[test]
    fn test_channel_without_result_is_error() {
        let result = classify(DeployMode::Preview, &target(None, None), raw(json!({})));
        assert!(!result.is_success());
    }

    #[test]
    fn test_production_url_from_project() {
        let result = classify(
            DeployMode::Production,
            &target(Some("demo"), None),
            raw(json!({ "status": "success", "result": { "hosting": "sites/demo/versions/1" } })),
        );
        match result.success() {
            Some(DeploySuccess::Production(production)) => {
                assert_eq!(production.hostname, "demo.web.app");
                assert_eq!(production.url, "https://demo.web.app/");
            }
            other => panic!("expected production success, got {other:?}"),
        }
    }

    #[test]
    fn test_production_url_from_target() {
        let result = classify(
            DeployMode::Production,
            &target(Some("demo"), Some("docs")),
            raw(json!({ "status": "success" })),
        );
        assert_eq!(result.success().unwrap().details_url(), Some("https://docs.web.app/"));
    }

    #[test]
    fn test_production_without_hostname_is_error() {
        let result = classify(
            DeployMode::Production,
            &target(None, None),
            raw(json!({ "status": "success" })),
        );
        assert!(result.failure().unwrap().message.contains("hostname"));
    }
}
