//! Branch to task link model

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Repository scope used for links and sessions that are not tied to a
/// real repository
pub const GLOBAL_REPO: &str = "GLOBAL";

/// Durable association between a branch and a tracker task
///
/// Unique per `(branch_name, repo_path)`; linking again overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BranchLink {
    /// Branch name
    pub branch_name: String,

    /// Repository the branch lives in, or [`GLOBAL_REPO`]
    pub repo_path: String,

    /// Tracker-assigned task identifier
    pub task_gid: String,

    /// Cached task name (may be stale)
    pub task_name: String,

    /// Commit the branch was created from
    pub created_hash: Option<String>,

    /// Ref the branch was created from
    pub created_ref: Option<String>,

    /// First link time (Unix milliseconds)
    pub created_at: i64,

    /// Last write time (Unix milliseconds)
    pub updated_at: i64,

    /// Store-wide write counter; higher means written more recently
    pub write_seq: i64,
}

impl BranchLink {
    /// Create a new, unsaved link
    pub fn new(
        branch_name: impl Into<String>,
        repo_path: impl Into<String>,
        task_gid: impl Into<String>,
        task_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            branch_name: branch_name.into(),
            repo_path: repo_path.into(),
            task_gid: task_gid.into(),
            task_name: task_name.into(),
            created_hash: None,
            created_ref: None,
            created_at: now,
            updated_at: now,
            write_seq: 0,
        }
    }

    /// Record where the branch was created from
    pub fn with_origin(mut self, created_hash: Option<String>, created_ref: Option<String>) -> Self {
        self.created_hash = created_hash;
        self.created_ref = created_ref;
        self
    }

    /// Whether this link belongs to a global (branchless) session
    pub fn is_global(&self) -> bool {
        self.repo_path == GLOBAL_REPO
    }
}
