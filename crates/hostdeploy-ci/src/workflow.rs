//! GitHub Actions workflow commands and step outputs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use hostdeploy_core::{DeploySuccess, Result};
use uuid::Uuid;

/// Step outputs, populated from the first successful target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutputs {
    pub urls: Vec<String>,
    pub expire_time: Option<String>,
    pub details_url: Option<String>,
}

impl ActionOutputs {
    pub fn from_success(success: &DeploySuccess) -> Self {
        Self {
            urls: success.urls().into_iter().map(str::to_string).collect(),
            expire_time: success.expire_time().map(|t| t.to_rfc3339()),
            details_url: success.details_url().map(str::to_string),
        }
    }

    /// `(name, value)` pairs; outputs without a value are omitted.
    pub fn pairs(&self) -> Result<Vec<(&'static str, String)>> {
        let mut pairs = vec![("urls", serde_json::to_string(&self.urls)?)];
        if let Some(expire_time) = &self.expire_time {
            pairs.push(("expire_time", expire_time.clone()));
        }
        if let Some(details_url) = &self.details_url {
            pairs.push(("details_url", details_url.clone()));
        }
        Ok(pairs)
    }

    /// Append the outputs to the `GITHUB_OUTPUT` file at `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        for (name, value) in self.pairs()? {
            let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
            writeln!(file, "{name}<<{delimiter}")?;
            writeln!(file, "{value}")?;
            writeln!(file, "{delimiter}")?;
        }
        Ok(())
    }
}

/// Start a collapsible log group.
pub fn start_group(name: &str) {
    println!("::group::{}", escape_data(name));
}

pub fn end_group() {
    println!("::endgroup::");
}

/// Emit an error annotation, optionally titled.
pub fn error_annotation(title: Option<&str>, message: &str) {
    println!("{}", error_command(title, message));
}

fn error_command(title: Option<&str>, message: &str) -> String {
    match title {
        Some(title) => format!("::error title={}::{}", escape_property(title), escape_data(message)),
        None => format!("::error::{}", escape_data(message)),
    }
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
