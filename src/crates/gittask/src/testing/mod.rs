//! Test infrastructure for the gittask crate
//!
//! In-memory fakes for the two collaborators the sync engine talks to, plus
//! a throwaway store. Fakes record every call so tests can assert on what
//! the engine asked for.

use crate::db::Database;
use crate::error::{GittaskError, Result};
use crate::models::CommitRecord;
use crate::repositories::{BranchLinkRepository, SessionRepository};
use crate::tracker::{TaskTracker, TrackerTask};
use crate::vcs::VersionControl;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// In-memory store with both repositories wired to it
pub struct TestStore {
    pub db: Arc<Database>,
    pub links: BranchLinkRepository,
    pub sessions: SessionRepository,
}

impl TestStore {
    pub async fn new() -> Result<Self> {
        let db = Arc::new(Database::in_memory().await?);
        Ok(Self {
            links: BranchLinkRepository::new(db.clone()),
            sessions: SessionRepository::new(db.clone()),
            db,
        })
    }
}

/// A recorded `push` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCall {
    pub remote: String,
    pub branch: String,
    pub set_upstream: bool,
}

/// Scriptable [`VersionControl`]
#[derive(Default)]
pub struct FakeVcs {
    current_branch: Option<String>,
    refs: HashSet<String>,
    commits: Vec<CommitRecord>,
    remote_urls: HashMap<String, String>,
    log_error: Option<String>,
    push_error: Option<String>,
    push_delay: Option<Duration>,
    pushes: Mutex<Vec<PushCall>>,
    log_ranges: Mutex<Vec<(String, String)>>,
}

impl FakeVcs {
    /// Repository with `current_branch` checked out and nothing on the remote
    pub fn new(current_branch: &str) -> Self {
        Self {
            current_branch: Some(current_branch.to_string()),
            ..Self::default()
        }
    }

    /// Repository in detached-HEAD state
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_ref(mut self, reference: &str) -> Self {
        self.refs.insert(reference.to_string());
        self
    }

    /// Commits returned for any range
    pub fn with_commits(mut self, commits: Vec<CommitRecord>) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_remote_url(mut self, remote: &str, url: &str) -> Self {
        self.remote_urls.insert(remote.to_string(), url.to_string());
        self
    }

    pub fn failing_log(mut self, message: &str) -> Self {
        self.log_error = Some(message.to_string());
        self
    }

    pub fn failing_push(mut self, message: &str) -> Self {
        self.push_error = Some(message.to_string());
        self
    }

    /// Make `push` sleep before returning
    pub fn slow_push(mut self, delay: Duration) -> Self {
        self.push_delay = Some(delay);
        self
    }

    pub fn pushes(&self) -> Vec<PushCall> {
        self.pushes.lock().clone()
    }

    pub fn log_ranges(&self) -> Vec<(String, String)> {
        self.log_ranges.lock().clone()
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    async fn ref_exists(&self, reference: &str) -> Result<bool> {
        Ok(self.refs.contains(reference))
    }

    async fn commits_between(&self, from_ref: &str, to_ref: &str) -> Result<Vec<CommitRecord>> {
        self.log_ranges
            .lock()
            .push((from_ref.to_string(), to_ref.to_string()));
        match &self.log_error {
            Some(message) => Err(GittaskError::Vcs(message.clone())),
            None => Ok(self.commits.clone()),
        }
    }

    async fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()> {
        self.pushes.lock().push(PushCall {
            remote: remote.to_string(),
            branch: branch.to_string(),
            set_upstream,
        });
        if let Some(delay) = self.push_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.push_error {
            Some(message) => Err(GittaskError::Vcs(message.clone())),
            None => Ok(()),
        }
    }

    async fn current_branch(&self) -> Result<String> {
        self.current_branch
            .clone()
            .ok_or_else(|| GittaskError::Vcs("HEAD is detached".to_string()))
    }

    async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        Ok(self.remote_urls.get(remote).cloned())
    }
}

/// A recorded `post_comment` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedComment {
    pub task_id: String,
    pub text: String,
}

/// Scriptable [`TaskTracker`]
pub struct FakeTracker {
    authenticated: bool,
    post_error: Option<String>,
    tasks: Vec<TrackerTask>,
    comments: Mutex<Vec<PostedComment>>,
}

impl FakeTracker {
    /// Tracker holding a credential
    pub fn new() -> Self {
        Self {
            authenticated: true,
            post_error: None,
            tasks: Vec::new(),
            comments: Mutex::new(Vec::new()),
        }
    }

    /// Tracker without a credential
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub fn failing_post(mut self, message: &str) -> Self {
        self.post_error = Some(message.to_string());
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TrackerTask>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn comments(&self) -> Vec<PostedComment> {
        self.comments.lock().clone()
    }
}

impl Default for FakeTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskTracker for FakeTracker {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn post_comment(&self, task_id: &str, text: &str) -> Result<()> {
        if !self.authenticated {
            return Err(GittaskError::AuthMissing("no token".to_string()));
        }
        if let Some(message) = &self.post_error {
            return Err(GittaskError::Tracker(message.clone()));
        }
        self.comments.lock().push(PostedComment {
            task_id: task_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn search_tasks(&self, _workspace_id: &str, query: &str) -> Result<Vec<TrackerTask>> {
        let query = query.to_lowercase();
        Ok(self
            .tasks
            .iter()
            .filter(|task| task.name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_vcs_records_pushes() {
        let vcs = FakeVcs::new("main").failing_push("rejected");
        assert!(vcs.push("origin", "main", true).await.is_err());
        assert_eq!(
            vcs.pushes(),
            vec![PushCall {
                remote: "origin".to_string(),
                branch: "main".to_string(),
                set_upstream: true,
            }]
        );
        assert!(FakeVcs::detached().current_branch().await.is_err());
    }

    #[tokio::test]
    async fn test_fake_tracker_search_filters() {
        let tracker = FakeTracker::new().with_tasks(vec![
            TrackerTask { id: "1".into(), name: "Fix login".into() },
            TrackerTask { id: "2".into(), name: "Docs".into() },
        ]);
        let found = tracker.search_tasks("ws", "LOGIN").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }
}
