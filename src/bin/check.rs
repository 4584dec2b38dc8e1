//! `check` - emit merge request versions newer than the given cursor

use anyhow::{Context, Result};
use clap::Parser;
use gitlab_mr_resource::check::resolve_versions;
use gitlab_mr_resource::config::ExecutionContext;
use gitlab_mr_resource::logging::init_logging;
use gitlab_mr_resource::platform::GitLabService;
use gitlab_mr_resource::types::CheckRequest;
use std::io::Write;
use std::process::ExitCode;

/// Discover GitLab merge requests that need a build.
///
/// Reads `{"source": ..., "version": ...}` on stdin and writes the new
/// versions as a JSON array on stdout.
#[derive(Parser)]
#[command(name = "check", version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> ExitCode {
    let _cli = Cli::parse();
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let request: CheckRequest = serde_json::from_reader(std::io::stdin().lock())
        .context("reading request from stdin")?;

    let ctx = ExecutionContext::from_env();
    let api = GitLabService::from_source(&request.source).context("configuring GitLab client")?;

    let outcome = resolve_versions(&api, &request.source, &ctx, request.version.as_ref()).await?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &outcome.versions).context("writing response")?;
    writeln!(stdout).context("writing response")?;
    Ok(())
}
