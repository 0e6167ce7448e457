//! hostdeploy CI - hosting deploys driven from a GitHub Actions run
//!
//! Provides the deploy orchestrator that:
//! - Runs one firebase-tools deploy per package, all concurrently
//! - Finalizes one status check per package as soon as it settles
//! - Creates or updates the single tracked comment on the pull request

pub mod channel;
pub mod classify;
pub mod context;
pub mod credentials;
pub mod fakes;
pub mod github;
pub mod invoker;
pub mod orchestrator;
pub mod reconciler;
pub mod status;
pub mod workflow;

// Re-export key types
pub use channel::resolve_channel_id;
pub use classify::classify;
pub use context::{ActionContext, PullRequestContext};
pub use credentials::{materialize, Credentials};
pub use github::{CheckRun, CommentAuthor, GithubClient, GithubError, IssueComment, RepoRef};
pub use invoker::{DeployInvoker, FirebaseCli, RawDeployOutput};
pub use orchestrator::{DeployOrchestrator, DeployRun, TargetOutcome};
pub use reconciler::{find_tracked_comment, reconcile, CommentApi, ReconcileOutcome};
pub use status::{GithubCheckReporter, LogStatusReporter, StatusCheck, StatusReporter};
pub use workflow::ActionOutputs;
