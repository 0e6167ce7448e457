//! In-memory fakes for the deploy, status and comment seams (testing only)
//!
//! Provides `ScriptedInvoker`, `RecordingStatusReporter`, and
//! `MemoryCommentApi` that satisfy the trait contracts without spawning
//! processes or talking to GitHub.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use hostdeploy_core::{CheckDetails, DeployError, DeployMode, DeploymentTarget, Result};

use crate::github::{CommentAuthor, IssueComment, RepoRef};
use crate::invoker::{DeployInvoker, RawDeployOutput};
use crate::reconciler::CommentApi;
use crate::status::{StatusCheck, StatusReporter};

// ---------------------------------------------------------------------------
// ScriptedInvoker
// ---------------------------------------------------------------------------

/// What a scripted target does when invoked.
#[derive(Debug, Clone)]
pub enum Script {
    Report(RawDeployOutput),
    Fail(String),
    Panic(String),
}

#[derive(Debug, Clone)]
struct Step {
    script: Script,
    delay: Duration,
}

/// Deploy invoker whose per-target behavior is scripted by target name.
/// Unscripted targets fail with an invocation error.
#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    steps: Mutex<HashMap<String, Step>>,
    calls: Mutex<Vec<(String, DeployMode)>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `target` with the JSON report `report`.
    pub fn report(self, target: &str, report: serde_json::Value) -> Self {
        let mut raw: RawDeployOutput = serde_json::from_value(report.clone()).unwrap_or_default();
        raw.text = report.to_string();
        self.script(target, Script::Report(raw), Duration::ZERO)
    }

    pub fn fail(self, target: &str, message: &str) -> Self {
        self.script(target, Script::Fail(message.to_string()), Duration::ZERO)
    }

    pub fn panic(self, target: &str, message: &str) -> Self {
        self.script(target, Script::Panic(message.to_string()), Duration::ZERO)
    }

    pub fn script(self, target: &str, script: Script, delay: Duration) -> Self {
        self.steps
            .lock()
            .unwrap()
            .insert(target.to_string(), Step { script, delay });
        self
    }

    /// Delay an already scripted target.
    pub fn delayed(self, target: &str, delay: Duration) -> Self {
        if let Some(step) = self.steps.lock().unwrap().get_mut(target) {
            step.delay = delay;
        }
        self
    }

    /// Targets invoked so far, in call order.
    pub fn calls(&self) -> Vec<(String, DeployMode)> {
        self.calls.lock().unwrap().clone()
    }

    async fn invoke(&self, target: &DeploymentTarget, mode: DeployMode) -> Result<RawDeployOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((target.name.clone(), mode));
        let step = self.steps.lock().unwrap().get(&target.name).cloned();
        let Some(step) = step else {
            return Err(DeployError::Invocation(format!(
                "no script for target '{}'",
                target.name
            )));
        };
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        match step.script {
            Script::Report(raw) => Ok(raw),
            Script::Fail(message) => Err(DeployError::Invocation(message)),
            Script::Panic(message) => panic!("{}", message),
        }
    }
}

#[async_trait]
impl DeployInvoker for ScriptedInvoker {
    async fn deploy_preview(
        &self,
        _credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput> {
        self.invoke(target, DeployMode::Preview).await
    }

    async fn deploy_production(
        &self,
        _credentials: &Path,
        target: &DeploymentTarget,
    ) -> Result<RawDeployOutput> {
        self.invoke(target, DeployMode::Production).await
    }
}

// ---------------------------------------------------------------------------
// RecordingStatusReporter
// ---------------------------------------------------------------------------

/// Status reporter that records every begin and finish per target.
#[derive(Debug, Default, Clone)]
pub struct RecordingStatusReporter {
    begun: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<Vec<(String, CheckDetails)>>>,
    fail_begin: Arc<AtomicBool>,
    fail_finish: Arc<AtomicBool>,
}

impl RecordingStatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    pub fn fail_finish(&self, fail: bool) {
        self.fail_finish.store(fail, Ordering::SeqCst);
    }

    pub fn begun(&self) -> Vec<String> {
        self.begun.lock().unwrap().clone()
    }

    pub fn finished(&self) -> Vec<(String, CheckDetails)> {
        self.finished.lock().unwrap().clone()
    }

    /// Final details of `target`, if its check was finished.
    pub fn details_for(&self, target: &str) -> Option<CheckDetails> {
        self.finished
            .lock()
            .unwrap()
            .iter()
            .find(|(name, _)| name == target)
            .map(|(_, details)| details.clone())
    }
}

struct RecordingCheck {
    target: String,
    finished: Arc<Mutex<Vec<(String, CheckDetails)>>>,
    fail_finish: Arc<AtomicBool>,
}

#[async_trait]
impl StatusReporter for RecordingStatusReporter {
    async fn begin(&self, target: &DeploymentTarget) -> anyhow::Result<Box<dyn StatusCheck>> {
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(anyhow!("check run creation rejected"));
        }
        self.begun.lock().unwrap().push(target.name.clone());
        Ok(Box::new(RecordingCheck {
            target: target.name.clone(),
            finished: Arc::clone(&self.finished),
            fail_finish: Arc::clone(&self.fail_finish),
        }))
    }
}

#[async_trait]
impl StatusCheck for RecordingCheck {
    async fn finish(self: Box<Self>, details: &CheckDetails) -> anyhow::Result<()> {
        if self.fail_finish.load(Ordering::SeqCst) {
            return Err(anyhow!("check run update rejected"));
        }
        self.finished
            .lock()
            .unwrap()
            .push((self.target.clone(), details.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryCommentApi
// ---------------------------------------------------------------------------

/// In-memory pull request conversation for a single repository.
#[derive(Debug)]
pub struct MemoryCommentApi {
    comments: Mutex<HashMap<u64, Vec<IssueComment>>>,
    next_id: AtomicU64,
    fail_list: AtomicBool,
    fail_update: AtomicBool,
    fail_create: AtomicBool,
    updates: AtomicUsize,
    creates: AtomicUsize,
}

impl Default for MemoryCommentApi {
    fn default() -> Self {
        Self {
            comments: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            fail_list: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            updates: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }
}

impl MemoryCommentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing comment; returns its id.
    pub fn seed(&self, pr_number: u64, author_type: &str, body: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.comments
            .lock()
            .unwrap()
            .entry(pr_number)
            .or_default()
            .push(IssueComment {
                id,
                body: Some(body.to_string()),
                user: Some(CommentAuthor {
                    login: if author_type == "Bot" {
                        "github-actions[bot]".to_string()
                    } else {
                        "octocat".to_string()
                    },
                    kind: author_type.to_string(),
                }),
            });
        id
    }

    pub fn comments(&self, pr_number: u64) -> Vec<IssueComment> {
        self.comments
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Successful updates so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Successful creates so far.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentApi for MemoryCommentApi {
    async fn list_comments(&self, _repo: &RepoRef, pr_number: u64) -> anyhow::Result<Vec<IssueComment>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(anyhow!("listing comments failed"));
        }
        Ok(self.comments(pr_number))
    }

    async fn update_comment(&self, _repo: &RepoRef, comment_id: u64, body: &str) -> anyhow::Result<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(anyhow!("updating comment {} failed", comment_id));
        }
        let mut comments = self.comments.lock().unwrap();
        let comment = comments
            .values_mut()
            .flat_map(|thread| thread.iter_mut())
            .find(|comment| comment.id == comment_id)
            .ok_or_else(|| anyhow!("comment {} not found", comment_id))?;
        comment.body = Some(body.to_string());
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_comment(&self, _repo: &RepoRef, pr_number: u64, body: &str) -> anyhow::Result<u64> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow!("creating comment failed"));
        }
        let id = self.seed(pr_number, "Bot", body);
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }
}
