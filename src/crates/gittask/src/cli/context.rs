//! Shared state for CLI commands
//!
//! Loads configuration, opens the store and binds git to the current
//! directory.

use crate::config::{ConfigLoader, GittaskConfig};
use crate::db::Database;
use crate::error::{GittaskError, Result};
use crate::init;
use crate::repositories::{BranchLinkRepository, SessionRepository};
use crate::services::{PushSync, SessionService};
use crate::tracker::{AsanaClient, TaskTracker};
use crate::vcs::{GitCli, VersionControl};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a command handler needs
pub struct CliContext {
    pub config: GittaskConfig,
    pub db: Arc<Database>,
    pub sessions: SessionService,
    pub vcs: Arc<dyn VersionControl>,
}

impl CliContext {
    /// Load configuration and open the store for the current directory
    pub async fn load() -> Result<Self> {
        info!("Loading configuration");
        let config = ConfigLoader::new()?.load().await?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: GittaskConfig) -> Result<Self> {
        let db_path = config.database_path()?;
        info!(path = %db_path.display(), "Opening database");
        let db = Arc::new(Database::initialize(&db_path).await?);

        let workdir = std::env::current_dir()
            .map_err(|e| GittaskError::Config(format!("Cannot determine current directory: {}", e)))?;
        let vcs: Arc<dyn VersionControl> = Arc::new(GitCli::new(workdir)?);

        let sessions = SessionService::new(
            BranchLinkRepository::new(db.clone()),
            SessionRepository::new(db.clone()),
        );

        Ok(Self {
            config,
            db,
            sessions,
            vcs,
        })
    }

    /// Repository scope for links: configured path, else the git top level
    pub async fn repo_path(&self) -> Option<String> {
        resolve_repo_path(&self.config, self.vcs.as_ref()).await
    }

    /// Repository scope, failing outside a work tree
    pub async fn require_repo_path(&self) -> Result<String> {
        self.repo_path().await.ok_or_else(|| {
            GittaskError::Vcs("Not inside a git repository (set repository.path to override)".to_string())
        })
    }

    /// Checked-out branch, or `None` when it cannot be read
    pub async fn current_branch(&self) -> Option<String> {
        self.vcs.current_branch().await.ok()
    }

    /// Branch given on the command line, else the checked-out branch
    pub async fn branch_or_current(&self, branch: Option<String>) -> Result<String> {
        match branch {
            Some(branch) => Ok(branch),
            None => self.vcs.current_branch().await,
        }
    }

    /// Asana client built from the tracker section
    pub fn tracker(&self) -> Result<Arc<AsanaClient>> {
        build_tracker(&self.config)
    }
}

/// Asana client for `config`
pub fn build_tracker(config: &GittaskConfig) -> Result<Arc<AsanaClient>> {
    let tracker = &config.tracker;
    Ok(Arc::new(AsanaClient::new(
        tracker.api_base.clone(),
        tracker.api_token.clone(),
        tracker.timeout(),
    )?))
}

/// Repository scope for links: `repository.path`, else the git top level
pub async fn resolve_repo_path(config: &GittaskConfig, vcs: &dyn VersionControl) -> Option<String> {
    if let Some(path) = config.repository.path.clone() {
        return Some(path);
    }
    match vcs.repo_root().await {
        Ok(root) => root,
        Err(e) => {
            debug!(error = %e, "Not inside a git work tree");
            None
        }
    }
}

/// Push orchestrator for `config`
///
/// Failing to open the store or to build the tracker client does not stop
/// the push; the problem is carried as a warning on the outcome.
pub async fn build_push_sync(config: &GittaskConfig, vcs: Arc<dyn VersionControl>) -> PushSync {
    let store = match config.database_path() {
        Ok(path) => Database::initialize(&path).await,
        Err(e) => Err(e),
    };

    let mut sync = match store {
        Ok(db) => PushSync::new(vcs.clone(), BranchLinkRepository::new(Arc::new(db))),
        Err(e) => {
            warn!(error = %e, "Link store unavailable, pushing without announce");
            PushSync::without_store(vcs.clone(), e)
        }
    };

    sync = match build_tracker(config) {
        Ok(tracker) => {
            let tracker: Arc<dyn TaskTracker> = tracker;
            sync.with_tracker(tracker)
        }
        Err(e) => {
            warn!(error = %e, "Tracker client unavailable");
            sync.with_tracker_error(e)
        }
    };

    if let Some(repo) = resolve_repo_path(config, vcs.as_ref()).await {
        sync = sync.with_repo_path(repo);
    }
    if let Some(base_url) = config.repository.base_url.clone() {
        sync = sync.with_base_url(base_url);
    }
    if let Some(timeout) = config.sync.push_timeout() {
        sync = sync.with_push_timeout(timeout);
    }
    sync
}

/// Check if gittask has a user configuration
pub fn is_initialized() -> bool {
    init::is_initialized()
}

/// Hint printed when no configuration exists yet
pub fn get_init_instructions() -> String {
    "gittask is not initialized. Run 'gittask init' to create ~/.gittask/config.toml.".to_string()
}
