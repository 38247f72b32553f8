//! `git` CLI implementation of [`VersionControl`]

use super::VersionControl;
use crate::error::{GittaskError, Result};
use crate::models::CommitRecord;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

const ENV_GIT_BIN: &str = "GITTASK_GIT_BIN";

/// Runs an external program and captures its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output>;
}

#[derive(Debug, Default, Clone)]
pub struct ProcessCommandRunner;

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output> {
        Command::new(program)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output()
            .await
    }
}

/// Git accessed through its command line
#[derive(Debug, Clone)]
pub struct GitCli<R: CommandRunner = ProcessCommandRunner> {
    runner: R,
    binary: PathBuf,
    workdir: PathBuf,
}

impl GitCli<ProcessCommandRunner> {
    /// Git in `workdir`, using `$GITTASK_GIT_BIN` or `git` from `PATH`
    pub fn new(workdir: impl Into<PathBuf>) -> Result<Self> {
        let binary = std::env::var_os(ENV_GIT_BIN)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("git"));
        if binary.as_os_str().is_empty() {
            return Err(GittaskError::Config(format!(
                "{ENV_GIT_BIN} is set but empty. Provide a valid git binary path or unset it."
            )));
        }
        Ok(Self::with_runner(ProcessCommandRunner, binary, workdir))
    }
}

impl<R: CommandRunner> GitCli<R> {
    pub fn with_runner(runner: R, binary: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            workdir: workdir.into(),
        }
    }

    fn args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    async fn run_git_raw(&self, args: &[OsString]) -> Result<Output> {
        debug!(args = ?args, "Running git");
        self.runner
            .run(&self.binary, args, &self.workdir)
            .await
            .map_err(|error| match error.kind() {
                io::ErrorKind::NotFound => GittaskError::Vcs(format!(
                    "Git CLI `{}` was not found. Install Git or set {ENV_GIT_BIN} to a valid binary path.",
                    self.binary.display()
                )),
                _ => GittaskError::Vcs(format!(
                    "Failed to execute Git CLI `{}`: {error}",
                    self.binary.display()
                )),
            })
    }

    async fn run_git(&self, args: &[OsString]) -> Result<Output> {
        let output = self.run_git_raw(args).await?;
        if output.status.success() {
            return Ok(output);
        }
        Err(self.command_failed(args, &output))
    }

    fn command_failed(&self, args: &[OsString], output: &Output) -> GittaskError {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        let detail = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            format!("exit status {}", output.status)
        };
        let rendered_args = args
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        GittaskError::Vcs(format!(
            "Git command failed (`{} {rendered_args}`): {detail}",
            self.binary.display()
        ))
    }

    fn stdout_line(output: &Output) -> Option<String> {
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    pub(crate) fn log_range_args(from_ref: &str, to_ref: &str) -> Vec<OsString> {
        Self::args(&[
            "log",
            "--reverse",
            "--pretty=format:%h|%s",
            &format!("{from_ref}..{to_ref}"),
            "--",
        ])
    }

    pub(crate) fn push_args(remote: &str, branch: &str, set_upstream: bool) -> Vec<OsString> {
        let mut args = vec![OsString::from("push")];
        if set_upstream {
            args.push(OsString::from("--set-upstream"));
        }
        args.push(OsString::from(remote));
        args.push(OsString::from(branch));
        args
    }
}

#[async_trait]
impl<R: CommandRunner> VersionControl for GitCli<R> {
    async fn ref_exists(&self, reference: &str) -> Result<bool> {
        let args = Self::args(&["rev-parse", "--verify", "--quiet", reference]);
        let output = self.run_git_raw(&args).await?;
        Ok(output.status.success())
    }

    async fn commits_between(&self, from_ref: &str, to_ref: &str) -> Result<Vec<CommitRecord>> {
        let output = self.run_git(&Self::log_range_args(from_ref, to_ref)).await?;
        Ok(CommitRecord::parse_log(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<()> {
        let output = self.run_git(&Self::push_args(remote, branch, set_upstream)).await?;
        // git reports push progress on stderr
        let progress = String::from_utf8_lossy(&output.stderr);
        if !progress.trim().is_empty() {
            debug!(output = %progress.trim(), "git push");
        }
        Ok(())
    }

    async fn current_branch(&self) -> Result<String> {
        let output = self
            .run_git(&Self::args(&["rev-parse", "--abbrev-ref", "HEAD"]))
            .await?;
        match Self::stdout_line(&output) {
            Some(branch) if branch != "HEAD" => Ok(branch),
            _ => Err(GittaskError::Vcs(
                "HEAD is detached; check out a branch first".to_string(),
            )),
        }
    }

    async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let output = self.run_git_raw(&Self::args(&["remote", "get-url", remote])).await?;
        if !output.status.success() {
            warn!(remote = %remote, "Remote has no URL");
            return Ok(None);
        }
        Ok(Self::stdout_line(&output))
    }

    async fn resolve_ref(&self, reference: &str) -> Result<Option<String>> {
        let args = Self::args(&["rev-parse", "--verify", "--quiet", reference]);
        let output = self.run_git_raw(&args).await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Self::stdout_line(&output))
    }

    async fn repo_root(&self) -> Result<Option<String>> {
        let output = self
            .run_git_raw(&Self::args(&["rev-parse", "--show-toplevel"]))
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Self::stdout_line(&output))
    }
}
