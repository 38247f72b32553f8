//! Active session repository
//!
//! The session lives in a single-row table (`id = 1`). Starting a session is
//! one upsert statement, so a reader sees either the previous session or the
//! new one.

use crate::db::Database;
use crate::error::{GittaskError, Result};
use crate::models::ActiveSession;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Repository for the single active-session slot
#[derive(Clone, Debug)]
pub struct SessionRepository {
    db: Arc<Database>,
}

impl SessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Make `(branch, repo_path, task_gid)` the active session, replacing any
    /// previous one
    pub async fn start(&self, branch: &str, repo_path: Option<&str>, task_gid: &str) -> Result<ActiveSession> {
        self.start_with_name(branch, repo_path, task_gid, None).await
    }

    /// Like [`start`](Self::start), also storing the task name on the session
    pub async fn start_with_name(
        &self,
        branch: &str,
        repo_path: Option<&str>,
        task_gid: &str,
        task_name: Option<&str>,
    ) -> Result<ActiveSession> {
        if branch.trim().is_empty() {
            return Err(GittaskError::InvalidInput("branch name is empty".to_string()));
        }
        if task_gid.trim().is_empty() {
            return Err(GittaskError::InvalidInput("task id is empty".to_string()));
        }

        let session = ActiveSession {
            branch: branch.to_string(),
            task_gid: task_gid.to_string(),
            repo_path: repo_path.map(str::to_string),
            task_name: task_name.map(str::to_string),
            started_at: Utc::now().timestamp_millis(),
        };

        sqlx::query(
            "INSERT INTO active_session (id, branch, repo_path, task_gid, task_name, started_at)
             VALUES (1, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 branch = excluded.branch,
                 repo_path = excluded.repo_path,
                 task_gid = excluded.task_gid,
                 task_name = excluded.task_name,
                 started_at = excluded.started_at"
        )
        .bind(&session.branch)
        .bind(&session.repo_path)
        .bind(&session.task_gid)
        .bind(&session.task_name)
        .bind(session.started_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| GittaskError::Database(format!("Failed to start session: {}", e)))?;

        debug!(branch = %session.branch, task = %session.task_gid, "Started session");
        Ok(session)
    }

    /// The active session, if any
    pub async fn active(&self) -> Result<Option<ActiveSession>> {
        sqlx::query_as::<_, ActiveSession>(
            "SELECT branch, task_gid, repo_path, task_name, started_at
             FROM active_session WHERE id = 1"
        )
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| GittaskError::Database(format!("Failed to load active session: {}", e)))
    }

    /// Remove the active session; returns whether one existed
    pub async fn clear(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM active_session WHERE id = 1")
            .execute(self.db.pool())
            .await
            .map_err(|e| GittaskError::Database(format!("Failed to clear session: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
