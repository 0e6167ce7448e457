//! Service account credential materialization.

use std::io::Write;
use std::path::{Path, PathBuf};

use hostdeploy_core::{DeployError, Result};
use tempfile::TempPath;
use tracing::info;

/// Credentials file handed to the deploy tool via
/// `GOOGLE_APPLICATION_CREDENTIALS`.
///
/// When the file was written by [`materialize`] it is removed on drop, so
/// keep this value alive until every deploy has finished.
#[derive(Debug)]
pub struct Credentials {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl Credentials {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Turn the raw credential input into a file path.
///
/// An input naming an existing file is used as-is. Anything else must be a
/// JSON document and is written to a private temporary `.json` file.
pub fn materialize(raw: &str) -> Result<Credentials> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DeployError::CredentialSetup(
            "service account credentials are empty".to_string(),
        ));
    }

    let candidate = Path::new(trimmed);
    if !trimmed.starts_with('{') && candidate.is_file() {
        info!(path = %candidate.display(), "Using existing credentials file");
        return Ok(Credentials {
            path: candidate.to_path_buf(),
            temp: None,
        });
    }

    serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
        DeployError::CredentialSetup(format!("service account is not valid JSON: {e}"))
    })?;

    let mut file = tempfile::Builder::new()
        .prefix("hostdeploy-gac-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| DeployError::CredentialSetup(format!("failed to create temp file: {e}")))?;
    file.write_all(trimmed.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| DeployError::CredentialSetup(format!("failed to write credentials: {e}")))?;

    let temp = file.into_temp_path();
    info!("Created a temporary file with Application Default Credentials");
    Ok(Credentials {
        path: temp.to_path_buf(),
        temp: Some(temp),
    })
}
