//! Push-then-announce orchestration
//!
//! ```text
//! PROBE_UPSTREAM -> DIFF_COMMITS -> PUSH -(ok)-> ANNOUNCE -> DONE
//!                                     \-(err)-> FAILED
//! ```
//!
//! Only the push decides success. Everything in the announce phase degrades
//! to a [`SyncWarning`] on the outcome.

use crate::error::GittaskError;
use crate::models::{BranchLink, CommitRecord, PushOutcome, SyncWarning, GLOBAL_REPO};
use crate::repositories::BranchLinkRepository;
use crate::services::CommitDiffResolver;
use crate::tracker::TaskTracker;
use crate::vcs::{web_url_from_remote, VersionControl};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Build the comment posted to a task after a push
///
/// ```
/// use gittask::models::CommitRecord;
/// use gittask::services::format_announcement;
///
/// let text = format_announcement(
///     "main",
///     "https://github.com/o/r",
///     &[CommitRecord::new("a1c2d3", "Fix bug")],
/// );
/// assert_eq!(
///     text,
///     "🚀 **Pushed to `main`**\n• [`a1c2d3`](https://github.com/o/r/commit/a1c2d3) - Fix bug"
/// );
/// ```
pub fn format_announcement(target_branch: &str, base_url: &str, commits: &[CommitRecord]) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut lines = Vec::with_capacity(commits.len() + 1);
    lines.push(format!("🚀 **Pushed to `{}`**", target_branch));
    for commit in commits {
        lines.push(format!(
            "• [`{hash}`]({base}/commit/{hash}) - {message}",
            hash = commit.hash,
            base = base_url,
            message = commit.message
        ));
    }
    lines.join("\n")
}

/// Pushes a branch and announces the published commits on its linked task
///
/// The link store and the tracker only serve the announce phase. When
/// either could not be set up the push still runs and the setup problem is
/// reported as a warning.
#[derive(Clone)]
pub struct PushSync {
    vcs: Arc<dyn VersionControl>,
    links: Option<BranchLinkRepository>,
    tracker: Option<Arc<dyn TaskTracker>>,
    setup_warnings: Vec<SyncWarning>,
    repo_path: Option<String>,
    base_url: Option<String>,
    push_timeout: Option<Duration>,
}

impl PushSync {
    pub fn new(vcs: Arc<dyn VersionControl>, links: BranchLinkRepository) -> Self {
        Self {
            links: Some(links),
            ..Self::new_unlinked(vcs)
        }
    }

    /// Orchestrator whose link store could not be opened; it pushes but
    /// never announces
    pub fn without_store(vcs: Arc<dyn VersionControl>, error: impl std::fmt::Display) -> Self {
        Self {
            setup_warnings: vec![SyncWarning::StoreUnavailable(error.to_string())],
            ..Self::new_unlinked(vcs)
        }
    }

    fn new_unlinked(vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            vcs,
            links: None,
            tracker: None,
            setup_warnings: Vec::new(),
            repo_path: None,
            base_url: None,
            push_timeout: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn TaskTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Record that the tracker client could not be built
    pub fn with_tracker_error(mut self, error: impl std::fmt::Display) -> Self {
        self.tracker = None;
        self.setup_warnings
            .push(SyncWarning::TrackerUnavailable(error.to_string()));
        self
    }

    /// Repository scope used for the link lookup
    pub fn with_repo_path(mut self, repo_path: impl Into<String>) -> Self {
        self.repo_path = Some(repo_path.into());
        self
    }

    /// Web base URL for commit links; derived from the remote when not set
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = Some(timeout);
        self
    }

    /// Push `branch` to `remote`, then post the pushed commits to the task
    /// linked to the checked-out branch
    pub async fn push_and_announce(&self, remote: &str, branch: &str) -> PushOutcome {
        let diff = CommitDiffResolver::new(self.vcs.clone())
            .resolve(remote, branch)
            .await;

        let mut outcome = PushOutcome {
            pushed: false,
            commits: diff.commits,
            announced: false,
            warnings: self
                .setup_warnings
                .iter()
                .cloned()
                .chain(diff.warning)
                .collect(),
            upstream_existed: diff.upstream_exists,
            failure: None,
        };

        let set_upstream = !outcome.upstream_existed;
        info!(remote = %remote, branch = %branch, set_upstream, "Pushing");

        if let Err(e) = self.push(remote, branch, set_upstream).await {
            warn!(remote = %remote, branch = %branch, error = %e, "Push failed");
            outcome.failure = Some(e.to_string());
            return outcome;
        }
        outcome.pushed = true;

        if outcome.commits.is_empty() {
            debug!(branch = %branch, "No new commits to announce");
            return outcome;
        }

        outcome.announced = self
            .announce(remote, branch, &outcome.commits, &mut outcome.warnings)
            .await;
        outcome
    }

    async fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> crate::Result<()> {
        let push = self.vcs.push(remote, branch, set_upstream);
        match self.push_timeout {
            Some(limit) => tokio::time::timeout(limit, push)
                .await
                .map_err(|_| GittaskError::Timeout {
                    operation: format!("git push {} {}", remote, branch),
                    duration: limit,
                })?,
            None => push.await,
        }
    }

    /// Post the announcement; returns whether a comment was posted
    async fn announce(
        &self,
        remote: &str,
        target_branch: &str,
        commits: &[CommitRecord],
        warnings: &mut Vec<SyncWarning>,
    ) -> bool {
        let Some(links) = &self.links else {
            debug!("No link store, nothing to announce");
            return false;
        };

        let source_branch = match self.vcs.current_branch().await {
            Ok(current) => current,
            Err(e) => {
                warnings.push(SyncWarning::SourceBranchUnknown(e.to_string()));
                target_branch.to_string()
            }
        };

        let link = match self.find_link(links, &source_branch).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!(branch = %source_branch, "Branch not linked, nothing to announce");
                return false;
            }
            Err(e) => {
                warnings.push(SyncWarning::LinkLookupFailed(e.to_string()));
                return false;
            }
        };

        let tracker = match &self.tracker {
            Some(tracker) if tracker.is_authenticated() => tracker,
            Some(_) => {
                warnings.push(SyncWarning::AuthMissing);
                return false;
            }
            None => {
                let setup_failed = self
                    .setup_warnings
                    .iter()
                    .any(|w| matches!(w, SyncWarning::TrackerUnavailable(_)));
                if !setup_failed {
                    warnings.push(SyncWarning::AuthMissing);
                }
                return false;
            }
        };

        let Some(base_url) = self.resolve_base_url(remote).await else {
            warnings.push(SyncWarning::BaseUrlUnknown);
            return false;
        };

        let text = format_announcement(target_branch, &base_url, commits);
        match tracker.post_comment(&link.task_gid, &text).await {
            Ok(()) => {
                info!(task = %link.task_gid, commits = commits.len(), "Announced push");
                true
            }
            Err(e) => {
                warn!(task = %link.task_gid, error = %e, "Failed to announce push");
                warnings.push(SyncWarning::AnnounceFailed(e.to_string()));
                false
            }
        }
    }

    /// Link for `branch` in this repository
    ///
    /// With a known repository only that repository and the GLOBAL scope
    /// count; a same-named branch elsewhere belongs to another task. The
    /// branch-only lookup is used when the repository is unknown.
    async fn find_link(&self, links: &BranchLinkRepository, branch: &str) -> crate::Result<Option<BranchLink>> {
        match self.repo_path.as_deref() {
            Some(repo) => match links.lookup(branch, Some(repo)).await? {
                Some(link) => Ok(Some(link)),
                None => links.lookup(branch, Some(GLOBAL_REPO)).await,
            },
            None => links.lookup(branch, None).await,
        }
    }

    async fn resolve_base_url(&self, remote: &str) -> Option<String> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Some(url.trim_end_matches('/').to_string());
        }
        match self.vcs.remote_url(remote).await {
            Ok(Some(url)) => web_url_from_remote(&url),
            Ok(None) => None,
            Err(e) => {
                debug!(remote = %remote, error = %e, "Could not read remote URL");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SyncState;
    use crate::testing::{FakeTracker, FakeVcs, TestStore};

    const BASE: &str = "https://github.com/o/r";

    fn one_commit_vcs() -> FakeVcs {
        FakeVcs::new("feature/x")
            .with_ref("origin/feature/x")
            .with_commits(vec![CommitRecord::new("a1c2d3", "Fix bug")])
    }

    async fn linked_store(branch: &str) -> TestStore {
        let store = TestStore::new().await.unwrap();
        store
            .links
            .link(branch, "/repo", "1234", "Task", None, None)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_first_push_sets_upstream_and_skips_announce() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(FakeVcs::new("feature/x").with_commits(vec![CommitRecord::new("a", "b")]));
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs.clone(), store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(outcome.commits.is_empty());
        assert!(!outcome.announced);
        assert!(!outcome.upstream_existed);
        assert_eq!(outcome.state(), SyncState::Done);
        assert!(vcs.pushes()[0].set_upstream);
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_one_commit_is_announced() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs());
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs.clone(), store.links.clone())
            .with_tracker(tracker.clone())
            .with_repo_path("/repo")
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(outcome.announced);
        assert_eq!(outcome.state(), SyncState::Done);
        assert!(!vcs.pushes()[0].set_upstream);

        let comments = tracker.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].task_id, "1234");
        assert!(comments[0].text.contains("a1c2d3"));
        assert!(comments[0].text.contains("Fix bug"));
        assert!(comments[0].text.contains("https://github.com/o/r/commit/a1c2d3"));
    }

    #[tokio::test]
    async fn test_commits_are_listed_in_order() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(
            FakeVcs::new("feature/x")
                .with_ref("origin/feature/x")
                .with_commits(vec![
                    CommitRecord::new("h1", "first | piped"),
                    CommitRecord::new("h2", "second"),
                ]),
        );
        let tracker = Arc::new(FakeTracker::new());

        PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        let text = &tracker.comments()[0].text;
        let first = text.find("h1").unwrap();
        let second = text.find("h2").unwrap();
        assert!(first < second);
        assert!(text.contains("first | piped"));
        assert!(text.contains("second"));
    }

    #[tokio::test]
    async fn test_push_failure_skips_announce() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs().failing_push("rejected (non-fast-forward)"));
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs.clone(), store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(!outcome.pushed);
        assert!(!outcome.announced);
        assert_eq!(outcome.state(), SyncState::Failed);
        assert!(outcome.failure.unwrap().contains("non-fast-forward"));
        assert_eq!(vcs.pushes().len(), 1);
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_announce_failure_keeps_push_success() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs());
        let tracker = Arc::new(FakeTracker::new().failing_post("503 Service Unavailable"));

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker)
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(!outcome.announced);
        assert_eq!(outcome.state(), SyncState::DoneWithWarnings);
        assert!(matches!(outcome.warnings[0], SyncWarning::AnnounceFailed(_)));
    }

    #[tokio::test]
    async fn test_unlinked_branch_is_silent() {
        let store = TestStore::new().await.unwrap();
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(Arc::new(one_commit_vcs()), store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(!outcome.announced);
        assert!(outcome.warnings.is_empty());
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_warns() {
        let store = linked_store("feature/x").await;

        let without_tracker = PushSync::new(Arc::new(one_commit_vcs()), store.links.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;
        assert_eq!(without_tracker.warnings, vec![SyncWarning::AuthMissing]);

        let unauthenticated = PushSync::new(Arc::new(one_commit_vcs()), store.links.clone())
            .with_tracker(Arc::new(FakeTracker::unauthenticated()))
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;
        assert!(unauthenticated.pushed);
        assert_eq!(unauthenticated.warnings, vec![SyncWarning::AuthMissing]);
    }

    #[tokio::test]
    async fn test_link_is_found_by_source_branch() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(
            FakeVcs::new("feature/x")
                .with_ref("origin/main")
                .with_commits(vec![CommitRecord::new("abc", "msg")]),
        );
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "main")
            .await;

        assert!(outcome.announced);
        assert!(tracker.comments()[0].text.starts_with("🚀 **Pushed to `main`**"));
    }

    #[tokio::test]
    async fn test_same_branch_linked_in_another_repository_is_ignored() {
        let store = TestStore::new().await.unwrap();
        store
            .links
            .link("main", "/repoA", "TASK-A", "Repo A work", None, None)
            .await
            .unwrap();
        let vcs = Arc::new(
            FakeVcs::new("main")
                .with_ref("origin/main")
                .with_commits(vec![CommitRecord::new("b1", "repo B commit")]),
        );
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .with_repo_path("/repoB")
            .with_base_url("https://github.com/o/repoB")
            .push_and_announce("origin", "main")
            .await;

        assert!(outcome.pushed);
        assert!(!outcome.announced);
        assert!(outcome.warnings.is_empty());
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_global_link_is_used_within_a_repository() {
        let store = TestStore::new().await.unwrap();
        store
            .links
            .link("main", GLOBAL_REPO, "G1", "Shared", None, None)
            .await
            .unwrap();
        let vcs = Arc::new(
            FakeVcs::new("main")
                .with_ref("origin/main")
                .with_commits(vec![CommitRecord::new("c1", "msg")]),
        );
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .with_repo_path("/repoB")
            .with_base_url(BASE)
            .push_and_announce("origin", "main")
            .await;

        assert!(outcome.announced);
        assert_eq!(tracker.comments()[0].task_id, "G1");
    }

    #[tokio::test]
    async fn test_unavailable_store_still_pushes() {
        let vcs = Arc::new(one_commit_vcs());
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::without_store(vcs.clone(), "database is locked")
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(!outcome.announced);
        assert_eq!(outcome.state(), SyncState::DoneWithWarnings);
        assert_eq!(
            outcome.warnings,
            vec![SyncWarning::StoreUnavailable("database is locked".to_string())]
        );
        assert_eq!(vcs.pushes().len(), 1);
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_tracker_setup_failure_still_pushes() {
        let store = linked_store("feature/x").await;

        let outcome = PushSync::new(Arc::new(one_commit_vcs()), store.links.clone())
            .with_tracker_error("TLS backend unavailable")
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert_eq!(
            outcome.warnings,
            vec![SyncWarning::TrackerUnavailable("TLS backend unavailable".to_string())]
        );
    }

    #[tokio::test]
    async fn test_detached_head_falls_back_to_target() {
        let store = linked_store("main").await;
        let vcs = Arc::new(
            FakeVcs::detached()
                .with_ref("origin/main")
                .with_commits(vec![CommitRecord::new("abc", "msg")]),
        );
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker)
            .with_base_url(BASE)
            .push_and_announce("origin", "main")
            .await;

        assert!(outcome.announced);
        assert!(matches!(outcome.warnings[0], SyncWarning::SourceBranchUnknown(_)));
    }

    #[tokio::test]
    async fn test_base_url_derived_from_remote() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs().with_remote_url("origin", "git@github.com:acme/app.git"));
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.announced);
        assert!(tracker.comments()[0]
            .text
            .contains("(https://github.com/acme/app/commit/a1c2d3)"));
    }

    #[tokio::test]
    async fn test_unknown_base_url_warns() {
        let store = linked_store("feature/x").await;
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(Arc::new(one_commit_vcs()), store.links.clone())
            .with_tracker(tracker.clone())
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert_eq!(outcome.warnings, vec![SyncWarning::BaseUrlUnknown]);
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn test_diff_failure_still_pushes() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs().failing_log("fatal: corrupt"));

        let outcome = PushSync::new(vcs.clone(), store.links.clone())
            .with_tracker(Arc::new(FakeTracker::new()))
            .with_base_url(BASE)
            .push_and_announce("origin", "feature/x")
            .await;

        assert!(outcome.pushed);
        assert!(!outcome.announced);
        assert!(matches!(outcome.warnings[0], SyncWarning::DiffUnavailable(_)));
        assert_eq!(vcs.pushes().len(), 1);
    }

    #[tokio::test]
    async fn test_push_timeout_is_failure() {
        let store = linked_store("feature/x").await;
        let vcs = Arc::new(one_commit_vcs().slow_push(Duration::from_secs(10)));
        let tracker = Arc::new(FakeTracker::new());

        let outcome = PushSync::new(vcs, store.links.clone())
            .with_tracker(tracker.clone())
            .with_base_url(BASE)
            .with_push_timeout(Duration::from_millis(50))
            .push_and_announce("origin", "feature/x")
            .await;

        assert_eq!(outcome.state(), SyncState::Failed);
        let failure = outcome.failure.unwrap();
        assert!(failure.contains("timed out after 50ms"), "{}", failure);
        assert!(tracker.comments().is_empty());
    }

    #[test]
    fn test_format_announcement_trims_base_slash() {
        let text = format_announcement("dev", "https://h/o/r/", &[CommitRecord::new("x1", "m")]);
        assert_eq!(text, "🚀 **Pushed to `dev`**\n• [`x1`](https://h/o/r/commit/x1) - m");
    }
}
