//! Unpushed commit enumeration

use crate::models::{CommitDiff, SyncWarning};
use crate::vcs::VersionControl;
use std::sync::Arc;
use tracing::{debug, warn};

/// Works out which commits a push of `branch` to `remote` will publish
#[derive(Clone)]
pub struct CommitDiffResolver {
    vcs: Arc<dyn VersionControl>,
}

impl CommitDiffResolver {
    pub fn new(vcs: Arc<dyn VersionControl>) -> Self {
        Self { vcs }
    }

    /// Commits on HEAD that `{remote}/{branch}` does not have, oldest first
    ///
    /// A missing upstream ref means a first push and yields no commits.
    /// Failures while reading history degrade to an empty list plus a
    /// warning; this never returns an error.
    pub async fn resolve(&self, remote: &str, branch: &str) -> CommitDiff {
        let upstream = format!("{}/{}", remote, branch);

        let upstream_exists = match self.vcs.ref_exists(&upstream).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(upstream = %upstream, error = %e, "Could not probe upstream ref");
                false
            }
        };

        if !upstream_exists {
            debug!(upstream = %upstream, "No upstream ref, first push");
            return CommitDiff::no_upstream();
        }

        match self.vcs.commits_between(&upstream, "HEAD").await {
            Ok(commits) => {
                debug!(upstream = %upstream, count = commits.len(), "Resolved unpushed commits");
                CommitDiff {
                    commits,
                    upstream_exists: true,
                    warning: None,
                }
            }
            Err(e) => {
                warn!(upstream = %upstream, error = %e, "Could not enumerate unpushed commits");
                CommitDiff {
                    commits: Vec::new(),
                    upstream_exists: true,
                    warning: Some(SyncWarning::DiffUnavailable(e.to_string())),
                }
            }
        }
    }
}
