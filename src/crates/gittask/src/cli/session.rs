//! Session command handlers

use super::context::CliContext;
use crate::error::Result;
use crate::models::{ActiveSession, SessionView};
use chrono::{Local, Utc};
use colored::Colorize;

/// Handle start command
///
/// With a task id the session is started directly; without one the branch
/// must already be linked.
pub async fn handle_start(
    ctx: &CliContext,
    branch: Option<String>,
    task_gid: Option<String>,
) -> Result<ActiveSession> {
    let branch = ctx.branch_or_current(branch).await?;
    let repo = ctx.repo_path().await;

    let session = match task_gid {
        Some(gid) => ctx.sessions.start(&branch, repo.as_deref(), &gid).await?,
        None => ctx.sessions.start_for_branch(&branch, repo.as_deref()).await?,
    };

    println!("{}", "✓ Session started".green().bold());
    println!("  Branch: {}", session.branch);
    println!("  Task ID: {}", session.task_gid);
    Ok(session)
}

/// Handle track-global command
pub async fn handle_track_global(ctx: &CliContext, task_gid: String, task_name: String) -> Result<ActiveSession> {
    let session = ctx.sessions.track_global(&task_gid, &task_name).await?;

    println!("{}", "✓ Tracking task without a branch".green().bold());
    println!("  Task: {} ({})", task_name, session.task_gid);
    println!("  Session key: {}", session.branch);
    Ok(session)
}

/// Handle stop command
pub async fn handle_stop(ctx: &CliContext) -> Result<()> {
    if ctx.sessions.stop().await? {
        println!("{}", "✓ Session stopped".green());
    } else {
        println!("{}", "No active session".yellow());
    }
    Ok(())
}

/// Handle status command
pub async fn handle_status(ctx: &CliContext) -> Result<Option<SessionView>> {
    let view = ctx.sessions.active_view().await?;

    match &view {
        None => println!("{}", "No active session".yellow()),
        Some(view) => {
            let session = &view.session;
            let name = if view.resolved {
                view.task_name.bold().to_string()
            } else {
                view.task_name.dimmed().to_string()
            };

            println!("{} {}", "Tracking:".bold(), name);
            println!("  Task ID: {}", session.task_gid);
            if session.is_global() {
                println!("  Branch: {}", "(global)".dimmed());
            } else {
                println!("  Branch: {}", session.branch);
                if let Some(repo) = &session.repo_path {
                    println!("  Repository: {}", repo);
                }
            }
            if let Some(started) = session.started_at_utc() {
                let elapsed = Utc::now().signed_duration_since(started);
                println!(
                    "  Started: {} ({}h {:02}m ago)",
                    started.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    elapsed.num_hours(),
                    elapsed.num_minutes() % 60
                );
            }
        }
    }

    Ok(view)
}
