//! Database repositories
//!
//! The link store and the active-session slot each own one table.

pub mod branch_link_repository;
pub mod session_repository;

pub use branch_link_repository::BranchLinkRepository;
pub use session_repository::SessionRepository;
