//! Deployment domain model.

pub mod check;
pub mod error;
pub mod result;
pub mod target;

pub use check::{CheckConclusion, CheckDetails};
pub use error::{DeployError, Result};
pub use result::{ChannelDeploy, DeployFailure, DeploySuccess, DeploymentResult, ProductionDeploy};
pub use target::{DeployConfig, DeployMode, DeploymentTarget, LIVE_CHANNEL};
