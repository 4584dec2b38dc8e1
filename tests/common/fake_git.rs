//! Recording git runner for testing materialization

use async_trait::async_trait;
use gitlab_mr_resource::error::{Error, Result};
use gitlab_mr_resource::materialize::GitRunner;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded git invocation
#[derive(Debug, Clone)]
pub struct GitCall {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Whether `<home>/.netrc` existed when the command ran
    pub netrc_present: bool,
}

impl GitCall {
    /// First argument, e.g. "clone"
    pub fn subcommand(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }
}

/// Fake git that records calls instead of running them
///
/// `clone` creates `<destination>/.git` (and `.gitmodules` when configured)
/// so the materializer finds the layout a real clone leaves behind.
#[derive(Default)]
pub struct FakeGit {
    calls: Mutex<Vec<GitCall>>,
    home: Option<PathBuf>,
    with_gitmodules: bool,
    fail_on: Option<String>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record whether `<home>/.netrc` exists at each call
    pub fn watching_home(mut self, home: &Path) -> Self {
        self.home = Some(home.to_path_buf());
        self
    }

    /// Make clones contain a `.gitmodules` file
    pub fn with_gitmodules(mut self) -> Self {
        self.with_gitmodules = true;
        self
    }

    /// Fail commands whose subcommand matches
    pub fn failing_on(mut self, subcommand: &str) -> Self {
        self.fail_on = Some(subcommand.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.args.iter().take(2).cloned().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

#[async_trait]
impl GitRunner for FakeGit {
    async fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<()> {
        let netrc_present = self
            .home
            .as_ref()
            .is_some_and(|home| home.join(".netrc").exists());
        self.calls.lock().unwrap().push(GitCall {
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
            netrc_present,
        });

        if self.fail_on.as_deref() == args.first().map(String::as_str) {
            return Err(Error::Git {
                command: args.join(" "),
                message: "exit status: 128".to_string(),
            });
        }

        if args.first().map(String::as_str) == Some("clone") {
            let destination = PathBuf::from(args.last().unwrap());
            fs::create_dir_all(destination.join(".git")).unwrap();
            if self.with_gitmodules {
                fs::write(
                    destination.join(".gitmodules"),
                    "[submodule \"lib\"]\n\tpath = lib\n\turl = https://git.example.com/lib.git\n",
                )
                .unwrap();
            }
        }

        Ok(())
    }
}
