//! Configuration management for gittask
//!
//! Supports dual-location configuration:
//! - User-level: ~/.gittask/config.toml
//! - Project-level: ./.gittask/config.toml
//!
//! Project-level config overrides user-level config.

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    DatabaseConfig, GittaskConfig, LoggingConfig, RepositoryConfig, SyncConfig, TrackerConfig,
    TOKEN_ENV_VAR,
};
