//! Worktree materialization for `in`
//!
//! Produces a checkout of the target branch with the merge request's head
//! commit merged in but not committed, reproducible from a [`Version`] alone.
//! A failed step leaves the destination as it is; the orchestrator retries
//! into a fresh directory.

mod credentials;
mod git;
mod ssh;

pub use credentials::{TOKEN_USER, netrc_contents, repository_url, write_netrc};
pub use git::{Git, GitRunner, SOURCE_REMOTE, SystemGit, TARGET_REMOTE, display_command};
pub use ssh::{SshSetup, setup_ssh_key, ssh_config};

use crate::config::{ExecutionContext, RepositoryUri};
use crate::error::{Result, StepContext};
use crate::platform::GitLabApi;
use crate::types::{Commit, MergeRequest, Metadata, MetadataField, Source, Version};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Snapshot file name inside the checkout's `.git` directory
pub const SNAPSHOT_FILE: &str = "merge-request.json";

/// Submodule descriptor that triggers submodule checkout
const GITMODULES: &str = ".gitmodules";

/// Result of a successful materialization
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Metadata for the orchestrator
    pub metadata: Metadata,
    /// The merge request, `updated_at` replaced by the version's timestamp
    pub merge_request: MergeRequest,
    /// Where the merge request snapshot was written
    pub snapshot_path: PathBuf,
}

/// Materialize `version` into `destination`
pub async fn materialize(
    api: &dyn GitLabApi,
    runner: &dyn GitRunner,
    source: &Source,
    ctx: &ExecutionContext,
    version: &Version,
    destination: &Path,
) -> Result<Materialized> {
    let mut mr = api
        .get_merge_request(version.id)
        .await
        .step("getting merge request")?;
    mr.updated_at = version.updated_at;

    let use_ssh = source.uses_ssh();
    if use_ssh {
        let uri = RepositoryUri::parse(&source.uri).step("parsing repository uri")?;
        let home = ctx.home().step("setting up ssh private key")?;
        setup_ssh_key(home, &source.private_key, uri.host())
            .step("setting up ssh private key")?;
    }

    let target_url = project_url(api, mr.target_project_id, source, use_ssh).await?;
    let source_url = project_url(api, mr.source_project_id, source, use_ssh).await?;

    let commit = api
        .get_commit(mr.source_project_id, &mr.sha)
        .await
        .step("getting merge request commit")?;

    info!(mr_iid = mr.iid, sha = %mr.sha, target = %mr.target_branch, "merging into target branch");
    let git = Git::new(runner);
    git.clone_branch(&target_url, &mr.target_branch, destination, source.insecure)
        .await?;
    git.add_source_remote(destination, &source_url).await?;
    git.update_remotes(destination).await?;
    git.merge_no_commit(destination, &mr.sha).await?;

    if source.updates_submodules() && destination.join(GITMODULES).is_file() {
        if !source.submodule_credentials.is_empty() {
            let home = ctx.home().step("creating .netrc")?;
            write_netrc(home, &source.submodule_credentials).step("creating .netrc")?;
        }
        git.update_submodules(destination).await?;
    }

    let snapshot_path = destination.join(".git").join(SNAPSHOT_FILE);
    let snapshot = serde_json::to_vec(&mr).step("encoding merge request snapshot")?;
    fs::write(&snapshot_path, snapshot).step("writing merge request snapshot")?;

    Ok(Materialized {
        metadata: build_metadata(&mr, &commit),
        merge_request: mr,
        snapshot_path,
    })
}

async fn project_url(
    api: &dyn GitLabApi,
    project_id: u64,
    source: &Source,
    use_ssh: bool,
) -> Result<String> {
    let project = api
        .get_project(project_id)
        .await
        .step("reading project from api")?;
    repository_url(&project, &source.private_token, use_ssh).step("building repository url")
}

/// Metadata shown for a materialized merge request, in display order
pub fn build_metadata(mr: &MergeRequest, commit: &Commit) -> Metadata {
    vec![
        MetadataField::new("id", mr.id.to_string()),
        MetadataField::new("iid", mr.iid.to_string()),
        MetadataField::new("sha", &mr.sha),
        MetadataField::new("message", &commit.title),
        MetadataField::new("title", &mr.title),
        MetadataField::new("author", &mr.author.name),
        MetadataField::new("source", &mr.source_branch),
        MetadataField::new("target", &mr.target_branch),
        MetadataField::new("url", &mr.web_url),
    ]
}
