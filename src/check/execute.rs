//! Check execution - effectful operations
//!
//! Fetches per-candidate data from GitLab and posts pending statuses for
//! emitted versions. Per-candidate failures never abort the batch.

use crate::check::plan::{Candidate, CommitLookup, NotesLookup, has_skip_marker};
use crate::platform::GitLabApi;
use crate::types::{CommitStatus, MergeRequest, Source};
use futures::stream::{self, StreamExt};
use tracing::warn;

/// Merge requests whose commit/notes are fetched at the same time
const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Outcome of posting a pending status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    /// Status accepted by GitLab
    Posted,
    /// Status rejected or unreachable; the version is still emitted
    Failed(String),
}

/// Fetch commit and notes for every merge request
///
/// Lookups run concurrently; the returned candidates keep input order.
pub async fn gather_candidates(
    api: &dyn GitLabApi,
    source: &Source,
    merge_requests: Vec<MergeRequest>,
) -> Vec<Candidate> {
    stream::iter(merge_requests)
        .map(|mr| gather_candidate(api, source, mr))
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .collect()
        .await
}

async fn gather_candidate(api: &dyn GitLabApi, source: &Source, mr: MergeRequest) -> Candidate {
    let commit = match api.get_commit(mr.project_id, &mr.sha).await {
        Ok(commit) => CommitLookup::Fetched(commit),
        Err(e) => {
            warn!(mr_iid = mr.iid, sha = %mr.sha, error = %e, "skipping MR, commit unavailable");
            CommitLookup::Failed(e.to_string())
        }
    };

    let wants_notes = match &commit {
        CommitLookup::Fetched(c) => !source.skip_trigger_comment && !has_skip_marker(c),
        CommitLookup::Failed(_) => false,
    };

    let notes = if wants_notes {
        match api.list_merge_request_notes(mr.project_id, mr.iid).await {
            Ok(notes) => NotesLookup::Fetched(notes),
            Err(e) => {
                warn!(mr_iid = mr.iid, error = %e, "ignoring notes, lookup failed");
                NotesLookup::Failed(e.to_string())
            }
        }
    } else {
        NotesLookup::NotRequested
    };

    Candidate {
        merge_request: mr,
        commit,
        notes,
    }
}

/// Mark the merge request's head commit as pending in its source project
pub async fn post_pending_status(
    api: &dyn GitLabApi,
    mr: &MergeRequest,
    status: &CommitStatus,
) -> StatusReport {
    match api
        .set_commit_status(mr.source_project_id, &mr.sha, status)
        .await
    {
        Ok(()) => StatusReport::Posted,
        Err(e) => {
            warn!(mr_iid = mr.iid, sha = %mr.sha, error = %e, "failed to set pending status");
            StatusReport::Failed(e.to_string())
        }
    }
}
