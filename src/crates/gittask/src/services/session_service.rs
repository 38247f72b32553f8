//! Session service: the active session plus the link store behind it
//!
//! Display code goes through here rather than the repositories so that a
//! session always has a task name to show, even when its link is gone.

use crate::error::{GittaskError, Result};
use crate::models::{
    global_branch_name, suggest_branch_name, ActiveSession, BranchLink, OverviewEntry, SessionView,
    GLOBAL_REPO, UNKNOWN_TASK_NAME,
};
use crate::repositories::{BranchLinkRepository, SessionRepository};
use std::collections::HashSet;
use tracing::{debug, info};

/// Service combining the session slot and the branch link store
#[derive(Clone, Debug)]
pub struct SessionService {
    links: BranchLinkRepository,
    sessions: SessionRepository,
}

impl SessionService {
    pub fn new(links: BranchLinkRepository, sessions: SessionRepository) -> Self {
        Self { links, sessions }
    }

    pub fn links(&self) -> &BranchLinkRepository {
        &self.links
    }

    /// Start tracking time on `task_gid` from `branch`, replacing any
    /// previous session
    pub async fn start(&self, branch: &str, repo_path: Option<&str>, task_gid: &str) -> Result<ActiveSession> {
        let session = self.sessions.start(branch, repo_path, task_gid).await?;
        info!(branch = %branch, task = %task_gid, "Session started");
        Ok(session)
    }

    /// Start a session for an already linked branch
    pub async fn start_for_branch(&self, branch: &str, repo_path: Option<&str>) -> Result<ActiveSession> {
        let link = self
            .find_link(branch, repo_path)
            .await?
            .ok_or_else(|| GittaskError::NotFound(format!("Branch '{}' is not linked to a task", branch)))?;

        let session = self
            .sessions
            .start_with_name(branch, repo_path, &link.task_gid, Some(&link.task_name))
            .await?;
        info!(branch = %branch, task = %link.task_gid, "Session started from link");
        Ok(session)
    }

    /// Track a task that has no branch
    ///
    /// The session is keyed by an `@global:` pseudonym in the GLOBAL scope,
    /// and the pseudonym is linked so the task name can be shown later.
    pub async fn track_global(&self, task_gid: &str, task_name: &str) -> Result<ActiveSession> {
        let branch = global_branch_name(task_name);
        self.links
            .link(&branch, GLOBAL_REPO, task_gid, task_name, None, None)
            .await?;
        let session = self
            .sessions
            .start_with_name(&branch, Some(GLOBAL_REPO), task_gid, Some(task_name))
            .await?;
        info!(branch = %branch, task = %task_gid, "Global session started");
        Ok(session)
    }

    /// Stop the active session; returns whether one was running
    pub async fn stop(&self) -> Result<bool> {
        self.sessions.clear().await
    }

    /// The active session with a display name
    ///
    /// The name comes from the session itself, then the link for
    /// `(branch, repo_path)`, then any link for the branch, and finally the
    /// "Unknown Task" placeholder.
    pub async fn active_view(&self) -> Result<Option<SessionView>> {
        let Some(session) = self.sessions.active().await? else {
            return Ok(None);
        };

        if let Some(name) = session.task_name.clone().filter(|n| !n.trim().is_empty()) {
            return Ok(Some(SessionView {
                session,
                task_name: name,
                resolved: true,
            }));
        }

        let link = self
            .find_link(&session.branch, session.repo_path.as_deref())
            .await?
            .filter(|link| link.task_gid == session.task_gid);
        let view = match link {
            Some(link) => SessionView {
                session,
                task_name: link.task_name,
                resolved: true,
            },
            None => {
                debug!(branch = %session.branch, task = %session.task_gid, "No link to the active task");
                SessionView {
                    session,
                    task_name: UNKNOWN_TASK_NAME.to_string(),
                    resolved: false,
                }
            }
        };
        Ok(Some(view))
    }

    /// Dashboard listing: the active session first, then each linked branch
    /// once
    pub async fn overview(&self, current_branch: Option<&str>) -> Result<Vec<OverviewEntry>> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        if let Some(view) = self.active_view().await? {
            let branch = view.session.branch.clone();
            entries.push(OverviewEntry {
                checked_out: current_branch == Some(branch.as_str()),
                branch: branch.clone(),
                repo_path: view.session.repo_path.clone(),
                task_gid: view.session.task_gid.clone(),
                task_name: view.task_name,
                active: true,
            });
            seen.insert(branch);
        }

        let mut links = self.links.all().await?;
        links.sort_by(|a, b| b.write_seq.cmp(&a.write_seq));

        for link in links {
            if !seen.insert(link.branch_name.clone()) {
                continue;
            }
            entries.push(OverviewEntry {
                checked_out: current_branch == Some(link.branch_name.as_str()),
                branch: link.branch_name,
                repo_path: Some(link.repo_path),
                task_gid: link.task_gid,
                task_name: link.task_name,
                active: false,
            });
        }

        Ok(entries)
    }

    /// Branch name to propose when creating a branch for `task_name`
    pub fn suggest_branch(&self, task_name: &str) -> String {
        suggest_branch_name(task_name)
    }

    /// Link for `(branch, repo_path)`, falling back to any repository
    pub async fn find_link(&self, branch: &str, repo_path: Option<&str>) -> Result<Option<BranchLink>> {
        if let Some(repo) = repo_path {
            if let Some(link) = self.links.lookup(branch, Some(repo)).await? {
                return Ok(Some(link));
            }
        }
        self.links.lookup(branch, None).await
    }
}
