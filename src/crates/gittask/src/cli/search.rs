//! Task search command handler

use super::context::CliContext;
use crate::error::{GittaskError, Result};
use crate::tracker::{TaskTracker, TrackerTask};
use colored::Colorize;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Suggested branch")]
    branch: String,
}

/// Handle search command
pub async fn handle_search(
    ctx: &CliContext,
    query: String,
    workspace: Option<String>,
) -> Result<Vec<TrackerTask>> {
    let workspace = workspace
        .or_else(|| ctx.config.tracker.workspace_gid.clone())
        .ok_or_else(|| {
            GittaskError::Config(
                "No workspace configured. Set tracker.workspace_gid or pass --workspace".to_string(),
            )
        })?;

    let tracker = ctx.tracker()?;
    if !tracker.is_authenticated() {
        return Err(GittaskError::AuthMissing(format!(
            "No Asana token. Set tracker.api_token or {}",
            crate::config::TOKEN_ENV_VAR
        )));
    }

    let tasks = tracker.search_tasks(&workspace, &query).await?;

    if tasks.is_empty() {
        println!("{}", format!("No tasks matching '{}'", query).yellow());
        return Ok(tasks);
    }

    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            name: task.name.clone(),
            branch: ctx.sessions.suggest_branch(&task.name),
        })
        .collect();
    println!("{}", Table::new(rows));

    Ok(tasks)
}
