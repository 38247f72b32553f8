//! Domain models for gittask
//!
//! Branch links and the active session are persisted; commit records and
//! push outcomes only live for the duration of a push.

pub mod branch_link;
pub mod session;
pub mod sync;

pub use branch_link::{BranchLink, GLOBAL_REPO};
pub use session::{
    global_branch_name, suggest_branch_name, ActiveSession, OverviewEntry, SessionView,
    GLOBAL_BRANCH_PREFIX, UNKNOWN_TASK_NAME,
};
pub use sync::{CommitDiff, CommitRecord, PushOutcome, SyncState, SyncWarning};
