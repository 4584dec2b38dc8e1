//! Git subprocess driver
//!
//! [`GitRunner`] is the seam to the git binary; [`Git`] builds the command
//! lines the materializer needs on top of it.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tracing::debug;
use url::Url;

/// Remote name for the target project clone
pub const TARGET_REMOTE: &str = "target";

/// Remote name for the source project
pub const SOURCE_REMOTE: &str = "source";

/// Runs git with the given arguments
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <args>` in `cwd` (or the current directory) and wait for it
    async fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<()>;
}

/// Runs the `git` found on `PATH`
///
/// Git's stdout is discarded so it cannot mix with the JSON response; stderr
/// is inherited for diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGit;

#[async_trait]
impl GitRunner for SystemGit {
    async fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<()> {
        let shown = display_command(args);
        debug!(command = %shown, "running git");

        let mut command = tokio::process::Command::new("git");
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let status = command.status().await.map_err(|e| Error::Git {
            command: shown.clone(),
            message: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Git {
                command: shown,
                message: status.to_string(),
            })
        }
    }
}

/// Arguments joined for logs and errors, with URL passwords masked
pub fn display_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| match Url::parse(arg) {
            Ok(mut url) if url.password().is_some() => {
                // set_password only fails for cannot-be-a-base URLs, which have no password
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            _ => arg.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The git operations used to build a merge worktree
pub struct Git<'a> {
    runner: &'a dyn GitRunner,
}

impl<'a> Git<'a> {
    /// Wrap a runner
    pub fn new(runner: &'a dyn GitRunner) -> Self {
        Self { runner }
    }

    /// Clone `branch` of `url` into `destination`, naming the remote `target`
    pub async fn clone_branch(
        &self,
        url: &str,
        branch: &str,
        destination: &Path,
        insecure: bool,
    ) -> Result<()> {
        let args = vec![
            "clone".to_string(),
            "-c".to_string(),
            format!("http.sslVerify={}", !insecure),
            "-o".to_string(),
            TARGET_REMOTE.to_string(),
            "-b".to_string(),
            branch.to_string(),
            url.to_string(),
            destination.to_string_lossy().into_owned(),
        ];
        self.runner.run(&args, None).await
    }

    /// Add the source project as a remote
    pub async fn add_source_remote(&self, worktree: &Path, url: &str) -> Result<()> {
        let args = [
            "remote".to_string(),
            "add".to_string(),
            SOURCE_REMOTE.to_string(),
            url.to_string(),
        ];
        self.runner.run(&args, Some(worktree)).await
    }

    /// Fetch all remotes
    pub async fn update_remotes(&self, worktree: &Path) -> Result<()> {
        let args = ["remote".to_string(), "update".to_string()];
        self.runner.run(&args, Some(worktree)).await
    }

    /// Merge `sha` into the checkout without committing
    pub async fn merge_no_commit(&self, worktree: &Path, sha: &str) -> Result<()> {
        let args = [
            "merge".to_string(),
            "--no-ff".to_string(),
            "--no-commit".to_string(),
            sha.to_string(),
        ];
        self.runner.run(&args, Some(worktree)).await
    }

    /// Initialize and update submodules recursively
    pub async fn update_submodules(&self, worktree: &Path) -> Result<()> {
        let args = [
            "submodule".to_string(),
            "update".to_string(),
            "--quiet".to_string(),
            "--init".to_string(),
            "--recursive".to_string(),
        ];
        self.runner.run(&args, Some(worktree)).await
    }
}
