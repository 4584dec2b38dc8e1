//! Version resolution for `check`
//!
//! Three phases, like the rest of the crate's effectful code:
//! 1. Gather - list open merge requests, fetch commits and notes (effectful)
//! 2. Plan - decide per candidate whether it emits (pure, see [`plan`])
//! 3. Execute - post pending statuses and collect versions (effectful)

mod execute;
mod plan;

pub use execute::{StatusReport, gather_candidates, post_pending_status};
pub use plan::{
    Candidate, CommitLookup, Decision, NotesLookup, SKIP_MARKER, SkipReason, TRIGGER_MARKER,
    activity_timestamp, evaluate_candidate, has_skip_marker,
};

use crate::config::ExecutionContext;
use crate::error::{Result, StepContext};
use crate::platform::{GitLabApi, MergeRequestQuery};
use crate::types::{CommitState, CommitStatus, Source, Version};
use tracing::{debug, info};

/// What happened to one listed merge request
#[derive(Debug, Clone)]
pub struct CandidateReport {
    /// Merge request iid
    pub iid: u64,
    /// Emit or skip, with reason
    pub decision: Decision,
    /// How the notes lookup went
    pub notes: NotesLookup,
    /// Status post outcome, only for emitted candidates
    pub status: Option<StatusReport>,
}

/// Result of a check run
#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    /// New versions in scan order
    pub versions: Vec<Version>,
    /// One report per listed merge request, in scan order
    pub reports: Vec<CandidateReport>,
}

/// Resolve the versions newer than `prior`
///
/// Fails only when the merge request listing or the configuration cannot be
/// resolved. Emitted versions keep GitLab's scan order (`updated_at`
/// ascending), which approximates but does not guarantee activity order.
pub async fn resolve_versions(
    api: &dyn GitLabApi,
    source: &Source,
    ctx: &ExecutionContext,
    prior: Option<&Version>,
) -> Result<CheckOutcome> {
    let status = CommitStatus {
        state: CommitState::Pending,
        name: ctx.pipeline_name(source),
        target_url: ctx
            .target_url(source)
            .step("resolving build target url")?,
    };

    let query = MergeRequestQuery::from_source(source);
    let merge_requests = api
        .list_merge_requests(&query)
        .await
        .step("retrieving opened merge requests")?;
    debug!(count = merge_requests.len(), "gathered candidates");

    let prior_at = prior.and_then(|v| v.updated_at);
    let candidates = gather_candidates(api, source, merge_requests).await;

    let mut outcome = CheckOutcome::default();
    for candidate in candidates {
        let decision = evaluate_candidate(&candidate, source, prior_at);
        let mr = &candidate.merge_request;

        let status_report = match &decision {
            Decision::Emit(updated_at) => {
                info!(mr_iid = mr.iid, %updated_at, "new version");
                let report = post_pending_status(api, mr, &status).await;
                outcome.versions.push(Version::new(mr.iid, *updated_at));
                Some(report)
            }
            Decision::Skip(reason) => {
                debug!(mr_iid = mr.iid, %reason, "skipping MR");
                None
            }
        };

        outcome.reports.push(CandidateReport {
            iid: mr.iid,
            decision,
            notes: candidate.notes,
            status: status_report,
        });
    }

    Ok(outcome)
}
