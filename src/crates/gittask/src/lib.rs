//! # gittask - git branches linked to Asana tasks
//!
//! gittask keeps a durable map from git branches to tracker tasks, tracks
//! which task is being worked on, and after a successful `git push` posts
//! the newly published commits as a comment on the linked task.
//!
//! ## Features
//!
//! - **Branch links** - `(branch, repository)` to task, stored in SQLite
//! - **Active session** - at most one tracked task at a time, including
//!   tasks with no branch (`@global:` sessions)
//! - **Push sync** - push first, announce second; an announce problem never
//!   turns a successful push into a failure
//! - **Dual-location config** - `~/.gittask/config.toml` and
//!   `./.gittask/config.toml`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gittask::repositories::BranchLinkRepository;
//! use gittask::services::PushSync;
//! use gittask::tracker::AsanaClient;
//! use gittask::vcs::GitCli;
//! use gittask::Database;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> gittask::Result<()> {
//! let db = Arc::new(Database::initialize("/tmp/gittask.db").await?);
//! let links = BranchLinkRepository::new(db);
//! links.link("feature/login", "/src/app", "1203", "Login page", None, None).await?;
//!
//! let tracker = AsanaClient::new(
//!     gittask::tracker::asana::DEFAULT_API_BASE,
//!     std::env::var("GITTASK_ASANA_TOKEN").ok(),
//!     Duration::from_secs(30),
//! )?;
//! let outcome = PushSync::new(Arc::new(GitCli::new("/src/app")?), links)
//!     .with_tracker(Arc::new(tracker))
//!     .with_repo_path("/src/app")
//!     .push_and_announce("origin", "feature/login")
//!     .await;
//! println!("{}", outcome.state());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod init;
pub mod models;
pub mod repositories;
pub mod services;
pub mod testing;
pub mod tracker;
pub mod vcs;
pub mod version;

mod error;

pub use config::GittaskConfig;
pub use db::Database;
pub use error::{GittaskError, Result};
pub use models::{BranchLink, CommitRecord, PushOutcome, SyncState, SyncWarning};
pub use services::{CommitDiffResolver, PushSync, SessionService};
pub use version::full_version as version_info;
