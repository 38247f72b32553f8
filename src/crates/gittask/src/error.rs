//! Error types for gittask
//!
//! Provides a unified error type for store, collaborator and configuration
//! failures. Advisory conditions raised during a push (missing upstream,
//! unavailable diff, failed announce) are not errors; see
//! [`crate::models::SyncWarning`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for gittask operations
pub type Result<T> = std::result::Result<T, GittaskError>;

/// Main error type for gittask operations
#[derive(Debug, Error)]
pub enum GittaskError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Version-control collaborator failed
    #[error("Git error: {0}")]
    Vcs(String),

    /// Task-tracker collaborator failed
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Tracker credential is missing
    #[error("Not authenticated: {0}")]
    AuthMissing(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation exceeded its deadline
    #[error("{operation} timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
