//! Task-tracker collaborator
//!
//! [`TaskTracker`] is the narrow surface the engine needs from a tracker:
//! post a comment on a task, and search tasks for the linking flows.
//! [`AsanaClient`] is the Asana REST implementation.

pub mod asana;

pub use asana::AsanaClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A task as returned by a tracker search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerTask {
    pub id: String,
    pub name: String,
}

/// Operations the engine consumes from a task tracker
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Whether a credential is available for write calls
    fn is_authenticated(&self) -> bool;

    /// Post `text` as a comment on `task_id`
    async fn post_comment(&self, task_id: &str, text: &str) -> Result<()>;

    /// Tasks in `workspace_id` matching `query`
    async fn search_tasks(&self, workspace_id: &str, query: &str) -> Result<Vec<TrackerTask>>;
}
