//! Initialization module for gittask
//!
//! Handles first-time setup: the ~/.gittask directory and a commented
//! default configuration file. The database is created on first use.

use crate::error::{GittaskError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration directory name (under home and under the project root)
pub const CONFIG_DIR: &str = ".gittask";

/// Configuration file name
pub const CONFIG_FILE: &str = "config.toml";

/// Default database file name
pub const DATABASE_FILE: &str = "gittask.db";

/// Get the gittask home directory (~/.gittask)
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined
pub fn get_gittask_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR))
        .ok_or_else(|| GittaskError::Config("Could not determine home directory".to_string()))
}

/// Get the path to the user-level configuration file
pub fn get_user_config_path() -> Result<PathBuf> {
    Ok(get_gittask_home()?.join(CONFIG_FILE))
}

/// Get the path to the project-level configuration file of the current directory
pub fn get_project_config_path() -> Result<PathBuf> {
    let project_root = std::env::current_dir()
        .map_err(|e| GittaskError::Config(format!("Cannot determine current directory: {}", e)))?;
    Ok(project_root.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Check if ~/.gittask exists with a configuration file
pub fn is_initialized() -> bool {
    get_user_config_path()
        .map(|path| path.exists())
        .unwrap_or(false)
}

/// Initialize the gittask home directory
///
/// Creates ~/.gittask and ~/.gittask/config.toml. An existing configuration
/// is only replaced when `force` is set.
pub fn initialize(force: bool) -> Result<PathBuf> {
    let home = get_gittask_home()?;
    initialize_at(&home, force)?;
    Ok(home)
}

/// Initialize an arbitrary home directory
pub fn initialize_at(home: &Path, force: bool) -> Result<()> {
    info!(path = %home.display(), "Initializing gittask");

    if !home.exists() {
        fs::create_dir_all(home)
            .map_err(|e| GittaskError::Config(format!("Failed to create directory: {}", e)))?;
        info!(path = %home.display(), "Created gittask home directory");
    }

    let config_path = home.join(CONFIG_FILE);
    if !config_path.exists() || force {
        create_default_config(&config_path)?;
        info!(path = %config_path.display(), "Created default configuration");
    } else {
        warn!(path = %config_path.display(), "Configuration already exists (use --force to overwrite)");
    }

    Ok(())
}

fn create_default_config(path: &Path) -> Result<()> {
    let default_config = r#"# gittask configuration
#
# User-level settings. Per-repository overrides go in ./.gittask/config.toml

[database]
# Database file path (relative to ~/.gittask)
path = "gittask.db"

[tracker]
provider = "asana"

# Personal access token; GITTASK_ASANA_TOKEN is used when unset
# api_token = "${ASANA_TOKEN}"

# Workspace used by `gittask search`
# workspace_gid = "1200000000000000"

# HTTP timeout in seconds
timeout_secs = 30

[repository]
# Web base URL for commit links; derived from the remote when unset
# base_url = "https://github.com/owner/repo"

default_remote = "origin"

[sync]
# Abort `gittask push` after this many seconds
# push_timeout_secs = 120

[logging]
# Log level: "trace", "debug", "info", "warn", "error"
level = "warn"
"#;

    fs::write(path, default_config)
        .map_err(|e| GittaskError::Config(format!("Failed to write config file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GittaskConfig;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_writes_parseable_config() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join(CONFIG_DIR);

        initialize_at(&home, false).unwrap();

        let content = fs::read_to_string(home.join(CONFIG_FILE)).unwrap();
        let config: GittaskConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.database.path, DATABASE_FILE);
        assert_eq!(config.repository.default_remote, "origin");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_initialize_keeps_existing_without_force() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().to_path_buf();
        fs::write(home.join(CONFIG_FILE), "# mine\n").unwrap();

        initialize_at(&home, false).unwrap();
        assert_eq!(fs::read_to_string(home.join(CONFIG_FILE)).unwrap(), "# mine\n");

        initialize_at(&home, true).unwrap();
        assert!(fs::read_to_string(home.join(CONFIG_FILE))
            .unwrap()
            .contains("[tracker]"));
    }

    #[test]
    fn test_project_config_path() {
        let path = get_project_config_path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with(".gittask/config.toml"));
    }
}
