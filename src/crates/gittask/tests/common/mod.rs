//! Common test utilities and setup

#![allow(dead_code)]

use gittask::db::Database;
use gittask::repositories::{BranchLinkRepository, SessionRepository};
use gittask::services::SessionService;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a file-backed test database in a fresh directory
pub async fn setup_test_db() -> (TempDir, PathBuf, Arc<Database>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("state").join("gittask.db");

    let db = Database::initialize(&db_path)
        .await
        .expect("Failed to create test database");

    (temp_dir, db_path, Arc::new(db))
}

/// Session service over `db`
pub fn session_service(db: &Arc<Database>) -> SessionService {
    SessionService::new(
        BranchLinkRepository::new(db.clone()),
        SessionRepository::new(db.clone()),
    )
}

/// Whether a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=gittask", "-c", "user.email=gittask@example.com"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A working repository cloned from a bare remote, with one commit on `main`
pub struct GitFixture {
    pub dir: TempDir,
    pub remote: PathBuf,
    pub work: PathBuf,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let remote = dir.path().join("remote.git");
        let work = dir.path().join("work");

        std::fs::create_dir_all(&remote).unwrap();
        git(&remote, &["init", "--bare"]);

        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init"]);
        git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(&work, &["remote", "add", "origin", remote.to_str().unwrap()]);

        let fixture = Self { dir, remote, work };
        fixture.commit("README.md", "Initial commit");
        fixture
    }

    /// Write `file` and commit it with `message`; returns the short hash
    pub fn commit(&self, file: &str, message: &str) -> String {
        std::fs::write(self.work.join(file), message).unwrap();
        git(&self.work, &["add", file]);
        git(&self.work, &["commit", "-m", message]);
        git(&self.work, &["rev-parse", "--short", "HEAD"])
    }
}
