//! Candidate evaluation - pure functions deciding which merge requests emit
//! a new version
//!
//! No I/O happens here. Each decision depends only on the candidate's own
//! fetched data, the source filters and the prior cursor.

use crate::types::{Commit, MergeRequest, Note, Source};
use chrono::{DateTime, Utc};

/// Commit title/message marker that suppresses builds
pub const SKIP_MARKER: &str = "[skip ci]";

/// Comment marker that counts the comment as activity
pub const TRIGGER_MARKER: &str = "[trigger ci]";

/// Result of fetching a merge request's head commit
#[derive(Debug, Clone)]
pub enum CommitLookup {
    /// Commit retrieved
    Fetched(Commit),
    /// Lookup failed; the candidate is skipped
    Failed(String),
}

/// Result of fetching a merge request's notes
///
/// Distinguishes "no notes" from "query failed" so degraded runs are visible.
#[derive(Debug, Clone)]
pub enum NotesLookup {
    /// Not fetched (trigger comments disabled or candidate already excluded)
    NotRequested,
    /// Notes retrieved
    Fetched(Vec<Note>),
    /// Lookup failed; treated as having no trigger comments
    Failed(String),
}

impl NotesLookup {
    /// Notes available for the timestamp computation
    pub fn notes(&self) -> &[Note] {
        match self {
            Self::Fetched(notes) => notes,
            Self::NotRequested | Self::Failed(_) => &[],
        }
    }
}

/// Everything fetched for one merge request
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The listed merge request
    pub merge_request: MergeRequest,
    /// Its head commit
    pub commit: CommitLookup,
    /// Its notes
    pub notes: NotesLookup,
}

/// Why a candidate was not emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Head commit could not be fetched
    CommitUnavailable(String),
    /// Commit title or message contains `[skip ci]`
    SkipMarker,
    /// GitLab does not report the MR as mergeable
    NotMergeable(String),
    /// MR is draft / work in progress
    WorkInProgress,
    /// Activity timestamp is not after the prior cursor
    NotNewer(DateTime<Utc>),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommitUnavailable(e) => write!(f, "commit unavailable: {e}"),
            Self::SkipMarker => write!(f, "commit contains {SKIP_MARKER}"),
            Self::NotMergeable(status) => write!(f, "merge status is {status:?}"),
            Self::WorkInProgress => write!(f, "work in progress"),
            Self::NotNewer(at) => write!(f, "no activity since cursor (last {at})"),
        }
    }
}

/// Decision for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Emit a version at this activity timestamp
    Emit(DateTime<Utc>),
    /// Do not emit
    Skip(SkipReason),
}

impl Decision {
    /// Whether the candidate is emitted
    pub const fn is_emit(&self) -> bool {
        matches!(self, Self::Emit(_))
    }
}

/// Whether the commit asks not to be built
pub fn has_skip_marker(commit: &Commit) -> bool {
    commit.title.contains(SKIP_MARKER) || commit.message.contains(SKIP_MARKER)
}

/// Latest meaningful activity on a merge request
///
/// The maximum of the commit time, the MR creation time and the last edit of
/// any note containing `[trigger ci]`. GitLab's own `updated_at` is ignored.
pub fn activity_timestamp(
    merge_request: &MergeRequest,
    commit: &Commit,
    notes: &[Note],
) -> DateTime<Utc> {
    let triggers = notes
        .iter()
        .filter(|n| n.body.contains(TRIGGER_MARKER))
        .filter_map(|n| n.updated_at);

    commit
        .committed_date
        .into_iter()
        .chain(triggers)
        .fold(merge_request.created_at, Ord::max)
}

/// Decide whether a candidate emits a new version
pub fn evaluate_candidate(
    candidate: &Candidate,
    source: &Source,
    prior: Option<DateTime<Utc>>,
) -> Decision {
    let commit = match &candidate.commit {
        CommitLookup::Fetched(commit) => commit,
        CommitLookup::Failed(e) => return Decision::Skip(SkipReason::CommitUnavailable(e.clone())),
    };

    if has_skip_marker(commit) {
        return Decision::Skip(SkipReason::SkipMarker);
    }

    let notes: &[Note] = if source.skip_trigger_comment {
        &[]
    } else {
        candidate.notes.notes()
    };
    let updated_at = activity_timestamp(&candidate.merge_request, commit, notes);

    let mr = &candidate.merge_request;
    if source.skip_not_mergeable && !mr.can_be_merged() {
        return Decision::Skip(SkipReason::NotMergeable(mr.merge_status.clone()));
    }

    if source.skip_work_in_progress && mr.is_work_in_progress() {
        return Decision::Skip(SkipReason::WorkInProgress);
    }

    if let Some(prior) = prior
        && updated_at <= prior
    {
        return Decision::Skip(SkipReason::NotNewer(updated_at));
    }

    Decision::Emit(updated_at)
}
