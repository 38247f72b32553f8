//! Configuration loader with dual-location support
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: ~/.gittask/config.toml
//! 3. Project-level config: ./.gittask/config.toml
//!
//! Layers are merged key by key, so a project file that only sets
//! `[repository]` keeps the user's `[tracker]` token.

use crate::config::schema::GittaskConfig;
use crate::error::{GittaskError, Result};
use crate::init;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration loader that handles both user and project configs
pub struct ConfigLoader {
    user_config_path: PathBuf,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    /// Loader for ~/.gittask/config.toml and ./.gittask/config.toml
    pub fn new() -> Result<Self> {
        Ok(Self::with_paths(
            init::get_user_config_path()?,
            init::get_project_config_path()?,
        ))
    }

    /// Loader for explicit file locations
    pub fn with_paths(user_config_path: impl Into<PathBuf>, project_config_path: impl Into<PathBuf>) -> Self {
        Self {
            user_config_path: user_config_path.into(),
            project_config_path: project_config_path.into(),
        }
    }

    /// Load configuration with project values taking precedence
    pub async fn load(&self) -> Result<GittaskConfig> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        for path in [&self.user_config_path, &self.project_config_path] {
            match Self::read_layer(path).await? {
                Some(layer) => {
                    debug!(path = %path.display(), "Loaded config layer");
                    merge_values(&mut merged, layer);
                }
                None => debug!(path = %path.display(), "Config layer not present"),
            }
        }

        let mut config: GittaskConfig = merged
            .try_into()
            .map_err(|e| GittaskError::Config(format!("Invalid configuration: {}", e)))?;

        config.resolve_env_vars();
        config.validate()?;

        info!("Configuration loaded");
        Ok(config)
    }

    async fn read_layer(path: &Path) -> Result<Option<toml::Value>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| GittaskError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let value = toml::from_str::<toml::Value>(&content)
            .map_err(|e| GittaskError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Ok(Some(value))
    }

    pub fn user_config_path(&self) -> &Path {
        &self.user_config_path
    }

    pub fn project_config_path(&self) -> &Path {
        &self.project_config_path
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
