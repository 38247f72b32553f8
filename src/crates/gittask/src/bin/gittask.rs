//! gittask CLI - link git branches to Asana tasks
//!
//! Main entry point for the gittask command-line tool.

use clap::{Parser, Subcommand};
use gittask::cli::{self, CliContext};
use gittask::config::ConfigLoader;
use gittask::vcs::{GitCli, VersionControl};
use gittask::version_info;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gittask")]
#[command(about = "gittask - link git branches to Asana tasks", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.gittask with a default configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,

    /// Link a branch in this repository to a task
    Link {
        /// Task ID
        task_gid: String,
        /// Task name
        task_name: String,
        /// Branch to link (default: checked-out branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Ref the branch was created from
        #[arg(long)]
        from: Option<String>,
    },

    /// Remove the link of a branch in this repository
    Unlink {
        /// Branch to unlink (default: checked-out branch)
        branch: Option<String>,
    },

    /// Start tracking a task from a branch
    Start {
        /// Branch (default: checked-out branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Task ID (default: the task linked to the branch)
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Track a task that has no branch
    TrackGlobal {
        /// Task ID
        task_gid: String,
        /// Task name
        task_name: String,
    },

    /// Stop tracking the active task
    Stop,

    /// Show the active session
    Status,

    /// List the active session and every linked branch
    List,

    /// Search tasks in the configured workspace
    Search {
        /// Search text
        query: String,
        /// Workspace ID (default: tracker.workspace_gid)
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Push a branch and post its new commits to the linked task
    Push {
        /// Remote (default: repository.default_remote)
        remote: Option<String>,
        /// Branch (default: checked-out branch)
        branch: Option<String>,
    },
}

fn init_tracing(verbose: bool, configured_level: &str) {
    let default_level = if verbose { "debug" } else { configured_level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("gittask={}", default_level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            init_tracing(cli.verbose, "info");
            println!("Initializing gittask...");
            match gittask::init::initialize(force) {
                Ok(home) => {
                    println!("✓ gittask initialized");
                    println!("  Configuration: {}", gittask::init::get_user_config_path()?.display());
                    println!("  Database: {}", home.join(gittask::init::DATABASE_FILE).display());
                    println!("\nSet tracker.api_token (or GITTASK_ASANA_TOKEN) to enable task comments.");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("✗ Initialization failed: {}", e);
                    Err(e.into())
                }
            }
        }
        Commands::Version => {
            println!("{}", version_info());
            Ok(())
        }
        command => {
            let config = ConfigLoader::new()?.load().await?;
            init_tracing(cli.verbose, &config.logging.level);

            if !cli::is_initialized() {
                tracing::debug!("{}", cli::get_init_instructions());
            }

            if let Commands::Push { remote, branch } = command {
                let workdir = std::env::current_dir()?;
                let vcs: Arc<dyn VersionControl> = Arc::new(GitCli::new(workdir)?);
                let outcome = cli::push::handle_push(&config, vcs, remote, branch).await?;
                std::process::exit(cli::push::exit_code(&outcome));
            }

            let ctx = CliContext::from_config(config).await?;
            run(&ctx, command).await
        }
    }
}

async fn run(ctx: &CliContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Link {
            task_gid,
            task_name,
            branch,
            from,
        } => {
            cli::link::handle_link(ctx, task_gid, task_name, branch, from).await?;
        }
        Commands::Unlink { branch } => {
            cli::link::handle_unlink(ctx, branch).await?;
        }
        Commands::Start { branch, task } => {
            cli::session::handle_start(ctx, branch, task).await?;
        }
        Commands::TrackGlobal { task_gid, task_name } => {
            cli::session::handle_track_global(ctx, task_gid, task_name).await?;
        }
        Commands::Stop => {
            cli::session::handle_stop(ctx).await?;
        }
        Commands::Status => {
            cli::session::handle_status(ctx).await?;
        }
        Commands::List => {
            cli::link::handle_list(ctx).await?;
        }
        Commands::Search { query, workspace } => {
            cli::search::handle_search(ctx, query, workspace).await?;
        }
        Commands::Init { .. } | Commands::Version | Commands::Push { .. } => {}
    }

    ctx.db.close().await;
    Ok(())
}
