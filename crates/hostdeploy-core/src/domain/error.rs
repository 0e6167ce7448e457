//! Error taxonomy for hostdeploy.
//!
//! Only setup and configuration errors abort a run. Per-target deploy
//! failures are carried as [`crate::DeploymentResult::Error`] values instead.

/// hostdeploy errors.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("credential setup failed: {0}")]
    CredentialSetup(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid package list: {0}")]
    InvalidPackages(String),

    #[error("deploy invocation failed: {0}")]
    Invocation(String),

    #[error("unexpected deploy output: {0}")]
    UnexpectedOutput(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hostdeploy operations.
pub type Result<T> = std::result::Result<T, DeployError>;
