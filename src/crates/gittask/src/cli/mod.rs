//! CLI command implementations
//!
//! Provides command handlers for the gittask binary.

pub mod context;
pub mod link;
pub mod push;
pub mod search;
pub mod session;

pub use context::{get_init_instructions, is_initialized, CliContext};
