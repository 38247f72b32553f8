//! Branch link command handlers

use super::context::CliContext;
use crate::error::{GittaskError, Result};
use crate::models::{BranchLink, OverviewEntry};
use colored::Colorize;
use tabled::{Table, Tabled};

/// Link display row for table output
#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Task ID")]
    task_gid: String,
    #[tabled(rename = "Repository")]
    repo: String,
}

impl From<OverviewEntry> for LinkRow {
    fn from(entry: OverviewEntry) -> Self {
        let marker = match (entry.active, entry.checked_out) {
            (true, true) => "▶ *",
            (true, false) => "▶",
            (false, true) => "*",
            (false, false) => "",
        };
        Self {
            marker: marker.to_string(),
            branch: entry.branch,
            task: truncate(&entry.task_name, 40),
            task_gid: entry.task_gid,
            repo: entry.repo_path.unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Handle link command
///
/// Links `branch` (the checked-out branch by default) in this repository to
/// a task. `from` records the ref the branch was created from.
pub async fn handle_link(
    ctx: &CliContext,
    task_gid: String,
    task_name: String,
    branch: Option<String>,
    from: Option<String>,
) -> Result<BranchLink> {
    if task_gid.trim().is_empty() {
        return Err(GittaskError::InvalidInput("task id is empty".to_string()));
    }

    let branch = ctx.branch_or_current(branch).await?;
    let repo = ctx.require_repo_path().await?;

    let origin = from.as_deref().unwrap_or("HEAD");
    let created_hash = ctx.vcs.resolve_ref(origin).await.ok().flatten();

    ctx.sessions
        .links()
        .link(
            &branch,
            &repo,
            &task_gid,
            &task_name,
            created_hash.as_deref(),
            from.as_deref(),
        )
        .await?;

    let link = ctx
        .sessions
        .links()
        .lookup(&branch, Some(&repo))
        .await?
        .ok_or_else(|| GittaskError::Database(format!("Link for '{}' was not stored", branch)))?;

    println!("{}", "✓ Branch linked".green().bold());
    println!("  Branch: {}", link.branch_name);
    println!("  Task: {} ({})", link.task_name, link.task_gid);
    if let Some(hash) = &link.created_hash {
        println!("  From: {} {}", link.created_ref.as_deref().unwrap_or("HEAD"), hash);
    }

    Ok(link)
}

/// Handle unlink command
pub async fn handle_unlink(ctx: &CliContext, branch: Option<String>) -> Result<()> {
    let branch = ctx.branch_or_current(branch).await?;
    let repo = ctx.require_repo_path().await?;

    if ctx.sessions.links().unlink(&branch, &repo).await? {
        println!("{}", format!("✓ Unlinked {}", branch).green());
    } else {
        println!("{}", format!("Branch {} is not linked in this repository", branch).yellow());
    }
    Ok(())
}

/// Handle list command: active session first, then every linked branch
pub async fn handle_list(ctx: &CliContext) -> Result<()> {
    let current = ctx.current_branch().await;
    let entries = ctx.sessions.overview(current.as_deref()).await?;

    if entries.is_empty() {
        println!("{}", "No linked branches".yellow());
        return Ok(());
    }

    let count = entries.len();
    let rows: Vec<LinkRow> = entries.into_iter().map(LinkRow::from).collect();
    println!("{}", Table::new(rows));
    println!("\n{} branch(es)   ▶ tracking   * checked out", count);

    Ok(())
}
