//! Services for session handling and push synchronization

pub mod commit_diff;
pub mod push_sync;
pub mod session_service;

pub use commit_diff::CommitDiffResolver;
pub use push_sync::{format_announcement, PushSync};
pub use session_service::SessionService;
