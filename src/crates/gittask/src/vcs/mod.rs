//! Version-control collaborator
//!
//! The sync engine only needs a handful of git operations. They sit behind
//! [`VersionControl`] so the engine can run against a fake in tests; the
//! production implementation is [`GitCli`], which shells out to `git`.

pub mod git;

pub use git::{CommandRunner, GitCli, ProcessCommandRunner};

use crate::error::Result;
use crate::models::CommitRecord;
use async_trait::async_trait;

/// Operations the sync engine consumes from version control
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// True iff `reference` resolves
    async fn ref_exists(&self, reference: &str) -> Result<bool>;

    /// Commits reachable from `to_ref` and not from `from_ref`, oldest first
    async fn commits_between(&self, from_ref: &str, to_ref: &str) -> Result<Vec<CommitRecord>>;

    /// Push `branch` to `remote`; any non-zero result is an error
    async fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()>;

    /// Name of the checked-out branch
    async fn current_branch(&self) -> Result<String>;

    /// Fetch URL of `remote`, when known
    async fn remote_url(&self, _remote: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Full commit hash `reference` points at, when it resolves
    async fn resolve_ref(&self, _reference: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Top-level directory of the working tree
    async fn repo_root(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Turn a git remote URL into an https web base URL
///
/// `git@github.com:owner/repo.git`, `ssh://git@github.com/owner/repo.git` and
/// `https://github.com/owner/repo.git` all become
/// `https://github.com/owner/repo`. Returns `None` for local paths.
pub fn web_url_from_remote(remote_url: &str) -> Option<String> {
    let url = remote_url.trim();
    let url = url.strip_suffix('/').unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);

    let (host, path) = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
        .or_else(|| url.strip_prefix("git://"))
    {
        let (authority, path) = rest.split_once('/')?;
        // Drop credentials and ports
        let host = authority.rsplit('@').next()?;
        let host = host.split(':').next()?;
        (host, path)
    } else {
        // scp-like syntax: [user@]host:path
        let (authority, path) = url.split_once(':')?;
        if authority.contains('/') {
            return None;
        }
        let host = authority.rsplit('@').next()?;
        (host, path)
    };

    let path = path.trim_matches('/');
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(format!("https://{}/{}", host, path))
}
