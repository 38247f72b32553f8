//! Push command handler

use super::context::build_push_sync;
use crate::config::GittaskConfig;
use crate::error::Result;
use crate::models::{PushOutcome, SyncState};
use crate::vcs::VersionControl;
use colored::Colorize;
use std::sync::Arc;

/// Handle push command
///
/// Runs without a `CliContext`: a store or tracker that cannot be set up
/// only costs the announce, never the push. Returns the outcome so the
/// binary can pick the exit code with [`exit_code`].
pub async fn handle_push(
    config: &GittaskConfig,
    vcs: Arc<dyn VersionControl>,
    remote: Option<String>,
    branch: Option<String>,
) -> Result<PushOutcome> {
    let remote = remote.unwrap_or_else(|| config.repository.default_remote.clone());
    let branch = match branch {
        Some(branch) => branch,
        None => vcs.current_branch().await?,
    };

    println!("Pushing {} to {}...", branch.bold(), remote);
    let outcome = build_push_sync(config, vcs).await.push_and_announce(&remote, &branch).await;
    print_outcome(&remote, &branch, &outcome);

    Ok(outcome)
}

/// Process exit code for a push: 1 only when the push itself failed
pub fn exit_code(outcome: &PushOutcome) -> i32 {
    if outcome.is_success() {
        0
    } else {
        1
    }
}

fn print_outcome(remote: &str, branch: &str, outcome: &PushOutcome) {
    if let Some(failure) = &outcome.failure {
        eprintln!("{} {}", "✗ Push failed:".red().bold(), failure);
        return;
    }

    if outcome.upstream_existed {
        println!("{}", format!("✓ Pushed {} to {}", branch, remote).green().bold());
    } else {
        println!(
            "{}",
            format!("✓ Pushed {} to {} and set upstream", branch, remote).green().bold()
        );
    }

    if !outcome.commits.is_empty() {
        println!("  {} new commit(s)", outcome.commits.len());
        for commit in &outcome.commits {
            println!("    {} {}", commit.hash.yellow(), commit.message);
        }
    }

    if outcome.announced {
        println!("{}", "✓ Posted commits to the linked task".green());
    }

    for warning in &outcome.warnings {
        println!("{} {}", "⚠".yellow(), warning.to_string().yellow());
    }

    if outcome.state() == SyncState::DoneWithWarnings {
        println!("{}", "Push succeeded with warnings".yellow());
    }
}
