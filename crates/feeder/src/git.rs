//! Source control operations backed by the `git` executable.
//!
//! The pipeline talks to the [`SourceControl`] trait; [`GitCli`] is the real
//! implementation and runs each operation as a subprocess. Child processes
//! are spawned with `kill_on_drop`, so dropping an in-flight future (on
//! timeout or shutdown) also kills the `git` process.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from running `git`.
#[derive(Debug, Error)]
pub enum GitError {
    /// The process could not be started.
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    /// The process exited unsuccessfully.
    #[error("git {command} failed ({status}): {stderr}")]
    Failed {
        command: &'static str,
        status: ExitStatus,
        stderr: String,
    },

    /// The process exceeded its deadline and was killed.
    #[error("git {command} timed out after {timeout:?}")]
    Timeout {
        command: &'static str,
        timeout: Duration,
    },
}

/// Source control operations used by the pipeline.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clone `url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &str, dest: &Path, timeout: Duration) -> Result<(), GitError>;

    /// Register `url` as remote `name` in the repository at `repo_dir`.
    async fn add_remote(&self, repo_dir: &Path, name: &str, url: &str) -> Result<(), GitError>;

    /// Push `branch` of the repository at `repo_dir` to `remote`.
    async fn push(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        timeout: Duration,
    ) -> Result<(), GitError>;
}

/// [`SourceControl`] implementation that shells out to `git`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(
        &self,
        dir: &Path,
        command: &'static str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<(), GitError> {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir)
            .arg(command)
            .args(args)
            // Never prompt for credentials: a private source repo fails fast.
            .env("GIT_ASKPASS", "/bin/echo")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| GitError::Timeout { command, timeout })??,
            None => cmd.output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Failed {
                command,
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        tracing::trace!(command, dir = %dir.display(), "git command succeeded");
        Ok(())
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn clone_repo(&self, url: &str, dest: &Path, timeout: Duration) -> Result<(), GitError> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let dest = dest.to_string_lossy();
        self.run(parent, "clone", &[url, dest.as_ref()], Some(timeout))
            .await
    }

    async fn add_remote(&self, repo_dir: &Path, name: &str, url: &str) -> Result<(), GitError> {
        self.run(repo_dir, "remote", &["add", name, url], None).await
    }

    async fn push(
        &self,
        repo_dir: &Path,
        remote: &str,
        branch: &str,
        timeout: Duration,
    ) -> Result<(), GitError> {
        self.run(repo_dir, "push", &[remote, branch], Some(timeout))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::process::Command as StdCommand;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn git_available() -> bool {
        StdCommand::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .current_dir(dir)
            .args(args)
            .status()
            .expect("git should run");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Create a bare repository with one commit on `main`.
    fn seeded_bare_repo(root: &Path) -> std::path::PathBuf {
        let work = root.join("seed");
        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "-q", "-b", "main"]);
        git(&work, &["config", "user.email", "feeder@example.com"]);
        git(&work, &["config", "user.name", "feeder"]);
        std::fs::write(work.join("README.md"), "hello\n").unwrap();
        git(&work, &["add", "README.md"]);
        git(&work, &["commit", "-q", "-m", "initial"]);

        let bare = root.join("source.git");
        git(
            root,
            &["clone", "-q", "--bare", "seed", bare.to_str().unwrap()],
        );
        bare
    }

    #[tokio::test]
    async fn clone_add_remote_and_push_round_trip() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let source = seeded_bare_repo(root.path());

        let dest_remote = root.path().join("dest.git");
        git(
            root.path(),
            &["init", "-q", "--bare", dest_remote.to_str().unwrap()],
        );

        let git = GitCli::new();
        let checkout = root.path().join("scratch").join("octocat").join("hello");
        std::fs::create_dir_all(checkout.parent().unwrap()).unwrap();

        git.clone_repo(source.to_str().unwrap(), &checkout, TIMEOUT)
            .await
            .expect("clone should succeed");
        assert!(checkout.join("README.md").exists());

        git.add_remote(&checkout, "ghe", dest_remote.to_str().unwrap())
            .await
            .expect("add remote should succeed");

        git.push(&checkout, "ghe", "HEAD", TIMEOUT)
            .await
            .expect("push should succeed");

        let out = StdCommand::new("git")
            .current_dir(&dest_remote)
            .args(["rev-parse", "--verify", "refs/heads/main"])
            .output()
            .unwrap();
        assert!(out.status.success(), "destination should have main");
    }

    #[tokio::test]
    async fn clone_of_missing_repo_reports_failure() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("does-not-exist.git");
        let dest = root.path().join("out");

        let err = GitCli::new()
            .clone_repo(missing.to_str().unwrap(), &dest, TIMEOUT)
            .await
            .expect_err("clone should fail");

        assert!(matches!(err, GitError::Failed { command: "clone", .. }));
        assert!(err.to_string().contains("git clone failed"));
    }

    #[tokio::test]
    async fn add_remote_outside_repository_fails() {
        if !git_available() {
            return;
        }
        let root = tempfile::tempdir().unwrap();

        let err = GitCli::new()
            .add_remote(root.path(), "ghe", "https://example.com/x.git")
            .await
            .expect_err("not a repository");

        assert!(matches!(err, GitError::Failed { command: "remote", .. }));
    }
}
