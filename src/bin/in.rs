//! `in` - materialize a merge request into a directory

use anyhow::{Context, Result};
use clap::Parser;
use gitlab_mr_resource::config::ExecutionContext;
use gitlab_mr_resource::logging::init_logging;
use gitlab_mr_resource::materialize::{SystemGit, materialize};
use gitlab_mr_resource::platform::GitLabService;
use gitlab_mr_resource::types::{InRequest, InResponse};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Check out a GitLab merge request merged into its target branch.
///
/// Reads `{"source": ..., "version": ...}` on stdin, populates the
/// destination with an uncommitted merge and writes the version and metadata
/// on stdout.
#[derive(Parser)]
#[command(name = "in", version, about)]
struct Cli {
    /// Directory to materialize the merge into
    destination: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let request: InRequest = serde_json::from_reader(std::io::stdin().lock())
        .context("reading request from stdin")?;

    let ctx = ExecutionContext::from_env();
    let api = GitLabService::from_source(&request.source).context("configuring GitLab client")?;

    let materialized = materialize(
        &api,
        &SystemGit,
        &request.source,
        &ctx,
        &request.version,
        &cli.destination,
    )
    .await?;

    let response = InResponse {
        version: request.version,
        metadata: materialized.metadata,
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response).context("writing response")?;
    writeln!(stdout).context("writing response")?;
    Ok(())
}
