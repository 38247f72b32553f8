//! Active session model

use super::branch_link::GLOBAL_REPO;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;

/// Branch prefix for sessions that track a task without a branch
pub const GLOBAL_BRANCH_PREFIX: &str = "@global:";

/// Display name used when a session's task cannot be resolved
pub const UNKNOWN_TASK_NAME: &str = "Unknown Task";

/// The single (branch, task) pair currently being worked on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActiveSession {
    /// Branch being worked on, or a `@global:` pseudonym
    pub branch: String,

    /// Tracker task identifier
    pub task_gid: String,

    /// Repository of the branch; `GLOBAL` for global sessions, absent when unknown
    pub repo_path: Option<String>,

    /// Task name, when the caller knew it at start time
    pub task_name: Option<String>,

    /// Start time (Unix milliseconds)
    pub started_at: i64,
}

impl ActiveSession {
    pub fn is_global(&self) -> bool {
        self.repo_path.as_deref() == Some(GLOBAL_REPO) || self.branch.starts_with(GLOBAL_BRANCH_PREFIX)
    }

    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.started_at)
    }
}

/// Active session with its task name resolved for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session: ActiveSession,
    pub task_name: String,
    /// False when `task_name` is the placeholder
    pub resolved: bool,
}

/// One row of the dashboard listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewEntry {
    pub branch: String,
    pub repo_path: Option<String>,
    pub task_gid: String,
    pub task_name: String,
    pub active: bool,
    pub checked_out: bool,
}

/// Branch pseudonym for a global session on `task_name`
pub fn global_branch_name(task_name: &str) -> String {
    format!("{}{}", GLOBAL_BRANCH_PREFIX, task_name.replace(' ', "_"))
}

/// Suggest a `feature/` branch name for a task
///
/// ```
/// use gittask::models::suggest_branch_name;
///
/// assert_eq!(suggest_branch_name("Fix: Login page!"), "feature/fix-login-page");
/// ```
pub fn suggest_branch_name(task_name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let invalid = INVALID.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("static pattern"));
    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[\s-]+").expect("static pattern"));

    let lowered = task_name.to_lowercase();
    let cleaned = invalid.replace_all(&lowered, "");
    let slug = separators.replace_all(&cleaned, "-");
    format!("feature/{}", slug.trim_matches('-'))
}
