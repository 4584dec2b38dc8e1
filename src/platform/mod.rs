//! GitLab API access
//!
//! The resource talks to GitLab only through [`GitLabApi`], so the check and
//! in logic can run against an in-memory implementation in tests.

mod gitlab;

pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{Commit, CommitStatus, MergeRequest, Note, Project, Source};
use async_trait::async_trait;

/// Filters for listing open merge requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequestQuery {
    /// All of these labels must be present
    pub labels: Vec<String>,
    /// Restrict to this target branch
    pub target_branch: Option<String>,
}

impl MergeRequestQuery {
    /// Build the query from the source filters
    pub fn from_source(source: &Source) -> Self {
        Self {
            labels: source.labels.clone(),
            target_branch: Some(source.target_branch.clone()).filter(|b| !b.is_empty()),
        }
    }
}

/// GitLab operations used by check and in
///
/// Merge requests are addressed within the configured project; commits,
/// notes, statuses and projects by numeric project id, since a merge request
/// may come from a fork.
#[async_trait]
pub trait GitLabApi: Send + Sync {
    /// List open merge requests, oldest `updated_at` first
    async fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>>;

    /// Get a merge request of the configured project by iid
    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequest>;

    /// Get a single commit
    async fn get_commit(&self, project_id: u64, sha: &str) -> Result<Commit>;

    /// List all notes on a merge request
    async fn list_merge_request_notes(&self, project_id: u64, iid: u64) -> Result<Vec<Note>>;

    /// Set a commit status
    async fn set_commit_status(
        &self,
        project_id: u64,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()>;

    /// Get a project descriptor
    async fn get_project(&self, project_id: u64) -> Result<Project>;
}
