//! Configuration schema for gittask

use crate::error::{GittaskError, Result};
use crate::tracker::asana::DEFAULT_API_BASE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no token is configured
pub const TOKEN_ENV_VAR: &str = "GITTASK_ASANA_TOKEN";

/// Main gittask configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GittaskConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path (relative to ~/.gittask or absolute)
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "gittask.db".to_string(),
        }
    }
}

/// Task tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Tracker provider; only "asana" is supported
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Personal access token (supports ${VAR} interpolation)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Workspace searched by `gittask search`
    #[serde(default)]
    pub workspace_gid: Option<String>,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_tracker_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "asana".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_tracker_timeout() -> u64 {
    30
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_token: None,
            workspace_gid: None,
            api_base: default_api_base(),
            timeout_secs: default_tracker_timeout(),
        }
    }
}

impl TrackerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Web base URL used for commit links; derived from the remote when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Remote pushed to when none is given
    #[serde(default = "default_remote")]
    pub default_remote: String,

    /// Repository scope for links; the git top-level directory when unset
    #[serde(default)]
    pub path: Option<String>,
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_remote: default_remote(),
            path: None,
        }
    }
}

/// Push synchronization configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Abort the push after this many seconds; no limit when unset
    #[serde(default)]
    pub push_timeout_secs: Option<u64>,
}

impl SyncConfig {
    pub fn push_timeout(&self) -> Option<Duration> {
        self.push_timeout_secs.map(Duration::from_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl GittaskConfig {
    /// Resolve `${VAR}` values and fall back to the token environment variable
    pub fn resolve_env_vars(&mut self) {
        self.tracker.api_token = self
            .tracker
            .api_token
            .as_deref()
            .map(Self::expand_env_var)
            .filter(|token| !token.trim().is_empty() && !token.starts_with("${"))
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.trim().is_empty()));

        self.tracker.workspace_gid = self.tracker.workspace_gid.as_deref().map(Self::expand_env_var);
        self.tracker.api_base = Self::expand_env_var(&self.tracker.api_base);
        self.repository.base_url = self.repository.base_url.as_deref().map(Self::expand_env_var);
    }

    /// Expand `${VAR_NAME}`, leaving the value untouched if the variable is unset
    fn expand_env_var(value: &str) -> String {
        match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(var_name) => std::env::var(var_name).unwrap_or_else(|_| value.to_string()),
            None => value.to_string(),
        }
    }

    /// Resolved database path; relative paths live under ~/.gittask
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = PathBuf::from(&self.database.path);
        if path.is_absolute() {
            return Ok(path);
        }
        Ok(crate::init::get_gittask_home()?.join(path))
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.tracker.provider != "asana" {
            return Err(GittaskError::Config(format!(
                "Unsupported tracker provider: {}. Supported providers: asana",
                self.tracker.provider
            )));
        }
        if self.repository.default_remote.trim().is_empty() {
            return Err(GittaskError::Config("repository.default_remote is empty".to_string()));
        }
        if self.sync.push_timeout_secs == Some(0) {
            return Err(GittaskError::Config(
                "sync.push_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GittaskConfig::default();
        assert_eq!(config.database.path, "gittask.db");
        assert_eq!(config.tracker.provider, "asana");
        assert_eq!(config.tracker.api_base, DEFAULT_API_BASE);
        assert_eq!(config.repository.default_remote, "origin");
        assert!(config.sync.push_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: GittaskConfig = toml::from_str(
            r#"
[tracker]
workspace_gid = "42"

[sync]
push_timeout_secs = 90
"#,
        )
        .unwrap();
        assert_eq!(config.tracker.workspace_gid.as_deref(), Some("42"));
        assert_eq!(config.tracker.timeout_secs, 30);
        assert_eq!(config.sync.push_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_expand_env_var() {
        std::env::set_var("GITTASK_TEST_EXPAND", "value");
        assert_eq!(GittaskConfig::expand_env_var("${GITTASK_TEST_EXPAND}"), "value");
        assert_eq!(GittaskConfig::expand_env_var("plain"), "plain");
        assert_eq!(
            GittaskConfig::expand_env_var("${GITTASK_TEST_UNSET_VAR}"),
            "${GITTASK_TEST_UNSET_VAR}"
        );
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = GittaskConfig::default();
        config.tracker.provider = "jira".to_string();
        assert!(matches!(config.validate(), Err(GittaskError::Config(_))));

        let mut config = GittaskConfig::default();
        config.sync.push_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
