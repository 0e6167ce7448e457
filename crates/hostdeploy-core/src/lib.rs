//! hostdeploy Core Library
//!
//! Domain types shared by the deploy orchestrator and the CLI:
//! - Deployment targets, modes and typed per-target results
//! - Deterministic deploy signatures
//! - Rendering of the tracked pull-request comment
//! - Tracing initialisation and structured lifecycle events

pub mod comment;
pub mod domain;
pub mod obs;
pub mod signature;
pub mod telemetry;

pub use comment::{format_expiry, render_comment, urls_markdown, CommentEntry, TRACKING_TOKEN};
pub use domain::{
    ChannelDeploy, CheckConclusion, CheckDetails, DeployConfig, DeployError, DeployFailure,
    DeployMode, DeploySuccess, DeploymentResult, DeploymentTarget, ProductionDeploy, Result,
    LIVE_CHANNEL,
};
pub use signature::{derive_signature, SIGNATURE_LEN};
pub use telemetry::init_tracing;
