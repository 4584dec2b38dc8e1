//! Core types for gitlab-mr-resource
//!
//! Protocol envelopes exchanged with the pipeline orchestrator, and the
//! subset of GitLab entities the resource reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Protocol types
// =============================================================================

/// Resource source configuration, supplied with every request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Source {
    /// Repository URI, e.g. `https://gitlab.com/group/project.git`
    pub uri: String,
    /// API token, also used as the HTTPS clone password
    #[serde(default)]
    pub private_token: String,
    /// SSH private key; when set, git uses SSH transport
    #[serde(default)]
    pub private_key: String,
    /// Skip TLS verification for API and git
    #[serde(default)]
    pub insecure: bool,
    /// Ignore merge requests flagged as work in progress / draft
    #[serde(default)]
    pub skip_work_in_progress: bool,
    /// Ignore merge requests GitLab cannot merge
    #[serde(default)]
    pub skip_not_mergeable: bool,
    /// Do not count `[trigger ci]` comments as activity
    #[serde(default)]
    pub skip_trigger_comment: bool,
    /// External URL of the CI server, falls back to `ATC_EXTERNAL_URL`
    #[serde(default)]
    pub concourse_url: String,
    /// Commit status name, falls back to `BUILD_PIPELINE_NAME`
    #[serde(default)]
    pub pipeline_name: String,
    /// Labels that must all be present on a merge request
    #[serde(default)]
    pub labels: Vec<String>,
    /// Only consider merge requests targeting this branch
    #[serde(default)]
    pub target_branch: String,
    /// `"none"` disables submodule checkout
    #[serde(default)]
    pub submodules: String,
    /// Per-host credentials for submodule remotes
    #[serde(default)]
    pub submodule_credentials: Vec<SubmoduleCredential>,
}

impl Source {
    /// Whether an SSH key was configured
    pub const fn uses_ssh(&self) -> bool {
        !self.private_key.is_empty()
    }

    /// Whether submodules should be initialized after the merge
    pub fn updates_submodules(&self) -> bool {
        self.submodules != "none"
    }
}

/// Credentials for one submodule host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoduleCredential {
    /// Host name as it appears in the submodule URL
    pub host: String,
    /// Login name
    pub username: String,
    /// Password or token
    pub password: String,
}

/// Change-detection cursor: a merge request iid and its activity timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Merge request iid (encoded as a string on the wire)
    #[serde(with = "string_id")]
    pub id: u64,
    /// Activity timestamp; `None` before the first emitted version
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Version {
    /// Create a version for a merge request at the given activity time
    pub const fn new(id: u64, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            updated_at: Some(updated_at),
        }
    }
}

/// A single displayed name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: String,
}

impl MetadataField {
    /// Create a metadata field
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered metadata shown by the orchestrator
pub type Metadata = Vec<MetadataField>;

/// Request read by `check`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    /// Source configuration
    pub source: Source,
    /// Last emitted version, absent on the first run
    #[serde(default)]
    pub version: Option<Version>,
}

/// Request read by `in`
#[derive(Debug, Clone, Deserialize)]
pub struct InRequest {
    /// Source configuration
    pub source: Source,
    /// Version to materialize
    pub version: Version,
}

/// Response written by `in`
#[derive(Debug, Clone, Serialize)]
pub struct InResponse {
    /// The requested version, unchanged
    pub version: Version,
    /// Description of the materialized merge request
    pub metadata: Metadata,
}

mod string_id {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid version id: {s:?}"))),
        }
    }
}

// =============================================================================
// GitLab entities
// =============================================================================

/// A GitLab merge request
///
/// Fields the resource does not interpret are kept in `extra` so the
/// snapshot written by `in` carries everything the API returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Global id
    pub id: u64,
    /// Project-scoped id
    pub iid: u64,
    /// Project the merge request belongs to (the target)
    pub project_id: u64,
    /// Project holding the source branch
    pub source_project_id: u64,
    /// Project holding the target branch
    pub target_project_id: u64,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Source branch name
    pub source_branch: String,
    /// Target branch name
    pub target_branch: String,
    /// Head commit of the source branch
    #[serde(default)]
    pub sha: String,
    /// Legacy work-in-progress flag
    #[serde(default)]
    pub work_in_progress: bool,
    /// Draft flag
    #[serde(default)]
    pub draft: bool,
    /// e.g. `can_be_merged`, `cannot_be_merged`, `unchecked`
    #[serde(default)]
    pub merge_status: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time as reported by GitLab
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Author
    #[serde(default)]
    pub author: Author,
    /// Web URL
    #[serde(default)]
    pub web_url: String,
    /// Remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MergeRequest {
    /// Status value GitLab reports for a conflict-free merge request
    pub const CAN_BE_MERGED: &'static str = "can_be_merged";

    /// Whether the merge request is marked draft / WIP
    pub const fn is_work_in_progress(&self) -> bool {
        self.work_in_progress || self.draft
    }

    /// Whether GitLab reports the merge request as mergeable
    pub fn can_be_merged(&self) -> bool {
        self.merge_status == Self::CAN_BE_MERGED
    }
}

/// Merge request author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Author {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Username
    #[serde(default)]
    pub username: String,
}

/// A repository commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Full SHA
    pub id: String,
    /// First line of the message
    #[serde(default)]
    pub title: String,
    /// Full message
    #[serde(default)]
    pub message: String,
    /// Committer timestamp
    #[serde(default)]
    pub committed_date: Option<DateTime<Utc>>,
}

/// A comment on a merge request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Note id
    pub id: u64,
    /// Comment text
    #[serde(default)]
    pub body: String,
    /// Last edit time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// System-generated note
    #[serde(default)]
    pub system: bool,
}

/// A GitLab project, as far as cloning is concerned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project id
    pub id: u64,
    /// `group/project`
    #[serde(default)]
    pub path_with_namespace: String,
    /// SSH clone URL
    pub ssh_url_to_repo: String,
    /// HTTPS clone URL
    pub http_url_to_repo: String,
}

/// Commit status states the resource sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// Build queued
    Pending,
}

impl std::fmt::Display for CommitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Options for setting a commit status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitStatus {
    /// State to set
    pub state: CommitState,
    /// Status name (the pipeline name)
    pub name: String,
    /// Link back to the build, if known
    pub target_url: Option<String>,
}
