//! Shared test utilities

#![allow(dead_code, unused_imports)]

mod fake_git;
mod mock_gitlab;

pub use fake_git::{FakeGit, GitCall};
pub use mock_gitlab::{MockGitLab, SetStatusCall};

use chrono::{DateTime, TimeZone, Utc};
use gitlab_mr_resource::config::ExecutionContext;
use gitlab_mr_resource::types::{Commit, MergeRequest, Note, Project, Source};

/// Fixed timestamp on 2024-05-01 at `hour`:00 UTC
pub fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

/// Project id used for same-project merge requests
pub const PROJECT_ID: u64 = 10;

/// Open, mergeable merge request in [`PROJECT_ID`] created at `created_at`
pub fn make_mr(iid: u64, sha: &str, created_at: DateTime<Utc>) -> MergeRequest {
    serde_json::from_value(serde_json::json!({
        "id": 1000 + iid,
        "iid": iid,
        "project_id": PROJECT_ID,
        "source_project_id": PROJECT_ID,
        "target_project_id": PROJECT_ID,
        "title": format!("MR {iid}"),
        "source_branch": format!("feature-{iid}"),
        "target_branch": "main",
        "sha": sha,
        "work_in_progress": false,
        "merge_status": "can_be_merged",
        "created_at": created_at,
        "updated_at": created_at,
        "author": { "name": "Ada Lovelace", "username": "ada" },
        "web_url": format!("https://gitlab.example.com/group/project/-/merge_requests/{iid}"),
        "labels": ["ready"],
    }))
    .unwrap()
}

/// Commit with the same title and message
pub fn make_commit(sha: &str, title: &str, committed: DateTime<Utc>) -> Commit {
    Commit {
        id: sha.to_string(),
        title: title.to_string(),
        message: format!("{title}\n"),
        committed_date: Some(committed),
    }
}

/// Non-system note
pub fn make_note(id: u64, body: &str, updated: DateTime<Utc>) -> Note {
    Note {
        id,
        body: body.to_string(),
        updated_at: Some(updated),
        system: false,
    }
}

/// Project `group/<name>` on gitlab.example.com
pub fn make_project(id: u64, name: &str) -> Project {
    Project {
        id,
        path_with_namespace: format!("group/{name}"),
        ssh_url_to_repo: format!("git@gitlab.example.com:group/{name}.git"),
        http_url_to_repo: format!("https://gitlab.example.com/group/{name}.git"),
    }
}

/// Source with default filters for gitlab.example.com/group/project
pub fn default_source() -> Source {
    Source {
        uri: "https://gitlab.example.com/group/project.git".to_string(),
        private_token: "glpat-secret".to_string(),
        ..Source::default()
    }
}

/// Context of a running CI build
pub fn build_context() -> ExecutionContext {
    ExecutionContext {
        external_url: Some("https://ci.example.com".to_string()),
        team_name: Some("main".to_string()),
        pipeline_name: Some("merge-requests".to_string()),
        job_name: Some("check".to_string()),
        build_name: Some("42".to_string()),
        home_dir: None,
    }
}
