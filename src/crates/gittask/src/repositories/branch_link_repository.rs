//! Branch link repository (the mapping store)

use crate::db::Database;
use crate::error::{GittaskError, Result};
use crate::models::BranchLink;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

const SELECT_COLUMNS: &str = "SELECT branch_name, repo_path, task_gid, task_name, created_hash,
                                     created_ref, created_at, updated_at, write_seq
                              FROM branch_links";

/// Repository for branch to task links
#[derive(Clone, Debug)]
pub struct BranchLinkRepository {
    db: Arc<Database>,
}

impl BranchLinkRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Link a branch to a task, overwriting any existing link for the same
    /// `(branch, repo_path)`
    pub async fn link(
        &self,
        branch: &str,
        repo_path: &str,
        task_gid: &str,
        task_name: &str,
        created_hash: Option<&str>,
        created_ref: Option<&str>,
    ) -> Result<()> {
        let link = BranchLink::new(branch, repo_path, task_gid, task_name)
            .with_origin(created_hash.map(str::to_string), created_ref.map(str::to_string));
        self.save(&link).await
    }

    /// Upsert a link by `(branch_name, repo_path)`
    ///
    /// On overwrite every field except `created_at` takes the new value and
    /// the row becomes the most recently written one.
    pub async fn save(&self, link: &BranchLink) -> Result<()> {
        if link.branch_name.trim().is_empty() {
            return Err(GittaskError::InvalidInput("branch name is empty".to_string()));
        }
        if link.task_gid.trim().is_empty() {
            return Err(GittaskError::InvalidInput("task id is empty".to_string()));
        }

        let now = Utc::now().timestamp_millis();

        sqlx::query(
            "INSERT INTO branch_links (branch_name, repo_path, task_gid, task_name, created_hash,
                                       created_ref, created_at, updated_at, write_seq)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?,
                     (SELECT COALESCE(MAX(write_seq), 0) + 1 FROM branch_links))
             ON CONFLICT(branch_name, repo_path) DO UPDATE SET
                 task_gid = excluded.task_gid,
                 task_name = excluded.task_name,
                 created_hash = excluded.created_hash,
                 created_ref = excluded.created_ref,
                 updated_at = excluded.updated_at,
                 write_seq = excluded.write_seq"
        )
        .bind(&link.branch_name)
        .bind(&link.repo_path)
        .bind(&link.task_gid)
        .bind(&link.task_name)
        .bind(&link.created_hash)
        .bind(&link.created_ref)
        .bind(link.created_at)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| GittaskError::Database(format!("Failed to save branch link: {}", e)))?;

        debug!(
            branch = %link.branch_name,
            repo = %link.repo_path,
            task = %link.task_gid,
            "Linked branch to task"
        );
        Ok(())
    }

    /// Find the link for a branch
    ///
    /// With `repo_path`, only an exact `(branch, repo_path)` match counts.
    /// Without it, the most recently written link with that branch name in
    /// any repository is returned.
    pub async fn lookup(&self, branch: &str, repo_path: Option<&str>) -> Result<Option<BranchLink>> {
        let link = match repo_path {
            Some(repo_path) => {
                sqlx::query_as::<_, BranchLink>(&format!(
                    "{} WHERE branch_name = ? AND repo_path = ?",
                    SELECT_COLUMNS
                ))
                .bind(branch)
                .bind(repo_path)
                .fetch_optional(self.db.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, BranchLink>(&format!(
                    "{} WHERE branch_name = ? ORDER BY write_seq DESC LIMIT 1",
                    SELECT_COLUMNS
                ))
                .bind(branch)
                .fetch_optional(self.db.pool())
                .await
            }
        }
        .map_err(|e| GittaskError::Database(format!("Failed to look up branch link: {}", e)))?;

        Ok(link)
    }

    /// All links, newest write first (callers should not rely on the order)
    pub async fn all(&self) -> Result<Vec<BranchLink>> {
        sqlx::query_as::<_, BranchLink>(&format!("{} ORDER BY write_seq DESC", SELECT_COLUMNS))
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| GittaskError::Database(format!("Failed to list branch links: {}", e)))
    }

    /// Remove a link; returns whether one existed
    pub async fn unlink(&self, branch: &str, repo_path: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM branch_links WHERE branch_name = ? AND repo_path = ?")
            .bind(branch)
            .bind(repo_path)
            .execute(self.db.pool())
            .await
            .map_err(|e| GittaskError::Database(format!("Failed to delete branch link: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored links
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM branch_links")
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| GittaskError::Database(format!("Failed to count branch links: {}", e)))
    }
}
