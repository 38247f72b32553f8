//! Push synchronization models
//!
//! Commit records and diffs are computed fresh on every push and never
//! persisted. [`PushOutcome`] is what a push-and-announce run reports back.

use serde::{Deserialize, Serialize};

/// A local commit not yet on the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Short commit hash
    pub hash: String,
    /// First line of the commit message
    pub message: String,
}

impl CommitRecord {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// Parse one `%h|%s` log line; `None` when it has no separator or no hash
    pub fn parse_log_line(line: &str) -> Option<Self> {
        let (hash, message) = line.split_once('|')?;
        let hash = hash.trim();
        if hash.is_empty() {
            return None;
        }
        Some(Self::new(hash, message))
    }

    /// Parse `git log --pretty=format:%h|%s` output, dropping malformed lines
    pub fn parse_log(output: &str) -> Vec<Self> {
        output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(Self::parse_log_line)
            .collect()
    }
}

/// Result of comparing the local branch to its remote-tracking ref
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitDiff {
    /// Commits reachable from HEAD but not from the tracking ref, oldest first
    pub commits: Vec<CommitRecord>,
    /// Whether `{remote}/{branch}` resolved
    pub upstream_exists: bool,
    /// Set when history could not be enumerated
    pub warning: Option<SyncWarning>,
}

impl CommitDiff {
    /// First push: nothing to compare against
    pub fn no_upstream() -> Self {
        Self::default()
    }
}

/// Advisory conditions raised during a push; none of them fail the push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SyncWarning {
    /// History enumeration failed; the commit list is empty
    DiffUnavailable(String),
    /// A link exists but no tracker credential is configured
    AuthMissing,
    /// Announce was skipped because no repository base URL is known
    BaseUrlUnknown,
    /// The current branch could not be determined
    SourceBranchUnknown(String),
    /// Reading the link store failed
    LinkLookupFailed(String),
    /// Posting the comment failed
    AnnounceFailed(String),
    StoreUnavailable(String),
    TrackerUnavailable(String),
}

impl std::fmt::Display for SyncWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiffUnavailable(detail) => {
                write!(f, "Could not determine unpushed commits: {}", detail)
            }
            Self::AuthMissing => write!(f, "Not authenticated with the tracker. Skipping comment."),
            Self::BaseUrlUnknown => write!(
                f,
                "No repository base URL configured or derivable from the remote. Skipping comment."
            ),
            Self::SourceBranchUnknown(detail) => write!(
                f,
                "Could not determine the current branch, using the push target for link lookup: {}",
                detail
            ),
            Self::LinkLookupFailed(detail) => {
                write!(f, "Could not read branch link: {}. Skipping comment.", detail)
            }
            Self::AnnounceFailed(detail) => write!(f, "Failed to post comment: {}", detail),
            Self::StoreUnavailable(detail) => {
                write!(f, "Link store unavailable: {}. Skipping comment.", detail)
            }
            Self::TrackerUnavailable(detail) => {
                write!(f, "Tracker client unavailable: {}. Skipping comment.", detail)
            }
        }
    }
}

/// Terminal state of a push-and-announce run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Done,
    DoneWithWarnings,
    Failed,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::DoneWithWarnings => "done_with_warnings",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a push-and-announce run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    /// Whether the push step succeeded; the only field that decides success
    pub pushed: bool,
    /// Commits that were new to the remote (empty on first push)
    pub commits: Vec<CommitRecord>,
    /// Whether a summary was posted to the linked task
    pub announced: bool,
    /// Advisory messages collected along the way
    pub warnings: Vec<SyncWarning>,
    /// Whether the remote-tracking ref existed before the push
    pub upstream_existed: bool,
    /// Why the push failed, when it did
    pub failure: Option<String>,
}

impl PushOutcome {
    pub fn state(&self) -> SyncState {
        if !self.pushed {
            SyncState::Failed
        } else if self.warnings.is_empty() {
            SyncState::Done
        } else {
            SyncState::DoneWithWarnings
        }
    }

    pub fn is_success(&self) -> bool {
        self.pushed
    }
}
