//! In-memory GitLab for testing check and in

use async_trait::async_trait;
use gitlab_mr_resource::error::{Error, Result};
use gitlab_mr_resource::platform::{GitLabApi, MergeRequestQuery};
use gitlab_mr_resource::types::{Commit, CommitStatus, MergeRequest, Note, Project};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Call record for `set_commit_status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStatusCall {
    pub project_id: u64,
    pub sha: String,
    pub status: CommitStatus,
}

/// Mock GitLab API
///
/// Features:
/// - Merge requests listed in insertion order
/// - Commits keyed by (project id, sha); unknown commits return 404
/// - Call tracking for verification
/// - Error injection per operation
#[derive(Default)]
pub struct MockGitLab {
    merge_requests: Mutex<Vec<MergeRequest>>,
    commits: Mutex<HashMap<(u64, String), Commit>>,
    notes: Mutex<HashMap<u64, Vec<Note>>>,
    projects: Mutex<HashMap<u64, Project>>,
    // Call tracking
    list_calls: Mutex<Vec<MergeRequestQuery>>,
    get_mr_calls: Mutex<Vec<u64>>,
    commit_calls: Mutex<Vec<(u64, String)>>,
    notes_calls: Mutex<Vec<u64>>,
    status_calls: Mutex<Vec<SetStatusCall>>,
    project_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    error_on_notes: Mutex<HashSet<u64>>,
    error_on_status: Mutex<Option<String>>,
}

impl MockGitLab {
    pub fn new() -> Self {
        Self::default()
    }

    // === Setup ===

    /// Add a merge request and the commit its `sha` points to
    pub fn add_merge_request(&self, mr: MergeRequest, commit: Commit) {
        self.commits
            .lock()
            .unwrap()
            .insert((mr.project_id, mr.sha.clone()), commit.clone());
        if mr.source_project_id != mr.project_id {
            self.commits
                .lock()
                .unwrap()
                .insert((mr.source_project_id, mr.sha.clone()), commit);
        }
        self.merge_requests.lock().unwrap().push(mr);
    }

    /// Add a merge request whose commit lookup will fail
    pub fn add_merge_request_without_commit(&self, mr: MergeRequest) {
        self.merge_requests.lock().unwrap().push(mr);
    }

    pub fn set_notes(&self, iid: u64, notes: Vec<Note>) {
        self.notes.lock().unwrap().insert(iid, notes);
    }

    pub fn add_project(&self, project: Project) {
        self.projects.lock().unwrap().insert(project.id, project);
    }

    // === Error injection ===

    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_notes(&self, iid: u64) {
        self.error_on_notes.lock().unwrap().insert(iid);
    }

    pub fn fail_status(&self, msg: &str) {
        *self.error_on_status.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification ===

    pub fn list_calls(&self) -> Vec<MergeRequestQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn get_mr_calls(&self) -> Vec<u64> {
        self.get_mr_calls.lock().unwrap().clone()
    }

    pub fn commit_calls(&self) -> Vec<(u64, String)> {
        self.commit_calls.lock().unwrap().clone()
    }

    pub fn notes_calls(&self) -> Vec<u64> {
        self.notes_calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> Vec<SetStatusCall> {
        self.status_calls.lock().unwrap().clone()
    }

    pub fn project_calls(&self) -> Vec<u64> {
        self.project_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitLabApi for MockGitLab {
    async fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>> {
        self.list_calls.lock().unwrap().push(query.clone());

        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(msg.clone()));
        }
        Ok(self.merge_requests.lock().unwrap().clone())
    }

    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequest> {
        self.get_mr_calls.lock().unwrap().push(iid);

        self.merge_requests
            .lock()
            .unwrap()
            .iter()
            .find(|mr| mr.iid == iid)
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 merge request !{iid} not found")))
    }

    async fn get_commit(&self, project_id: u64, sha: &str) -> Result<Commit> {
        self.commit_calls
            .lock()
            .unwrap()
            .push((project_id, sha.to_string()));

        self.commits
            .lock()
            .unwrap()
            .get(&(project_id, sha.to_string()))
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 commit {sha} not found")))
    }

    async fn list_merge_request_notes(&self, _project_id: u64, iid: u64) -> Result<Vec<Note>> {
        self.notes_calls.lock().unwrap().push(iid);

        if self.error_on_notes.lock().unwrap().contains(&iid) {
            return Err(Error::GitLabApi("500 notes unavailable".to_string()));
        }
        Ok(self
            .notes
            .lock()
            .unwrap()
            .get(&iid)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_commit_status(
        &self,
        project_id: u64,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()> {
        self.status_calls.lock().unwrap().push(SetStatusCall {
            project_id,
            sha: sha.to_string(),
            status: status.clone(),
        });

        if let Some(msg) = self.error_on_status.lock().unwrap().as_ref() {
            return Err(Error::GitLabApi(msg.clone()));
        }
        Ok(())
    }

    async fn get_project(&self, project_id: u64) -> Result<Project> {
        self.project_calls.lock().unwrap().push(project_id);

        self.projects
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 project {project_id} not found")))
    }
}
