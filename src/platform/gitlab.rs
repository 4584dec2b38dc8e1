//! GitLab REST implementation of [`GitLabApi`]

use crate::config::RepositoryUri;
use crate::error::{Error, Result};
use crate::platform::{GitLabApi, MergeRequestQuery};
use crate::types::{Commit, CommitStatus, MergeRequest, Note, Project, Source};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints (GitLab's maximum)
const PER_PAGE: &str = "100";

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
    project_path: String,
}

#[derive(Serialize)]
struct CommitStatusPayload<'a> {
    state: String,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
}

impl GitLabService {
    /// Create a service for `project_path` against an API base URL
    /// (`https://host/api/v4`)
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        project_path: impl Into<String>,
        insecure: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_path: project_path.into(),
        })
    }

    /// Create a service from the source configuration
    pub fn from_source(source: &Source) -> Result<Self> {
        let uri = RepositoryUri::parse(&source.uri)?;
        Self::new(
            uri.api_base_url(),
            source.private_token.clone(),
            uri.project_path,
            source.insecure,
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(value)
    }

    /// GET every page of a list endpoint, following `X-Next-Page`
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = "1".to_string();

        loop {
            let response = self
                .client
                .get(url)
                .header(TOKEN_HEADER, &self.token)
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", page.as_str())])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;

            let next_page = response
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string);

            let mut batch: Vec<T> = response.json().await?;
            items.append(&mut batch);

            match next_page {
                Some(next) if next != page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl GitLabApi for GitLabService {
    async fn list_merge_requests(&self, query: &MergeRequestQuery) -> Result<Vec<MergeRequest>> {
        debug!(project = %self.project_path, ?query, "listing open MRs");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let mut params = vec![
            ("state", "opened".to_string()),
            ("order_by", "updated_at".to_string()),
            ("sort", "asc".to_string()),
        ];
        if !query.labels.is_empty() {
            params.push(("labels", query.labels.join(",")));
        }
        if let Some(branch) = &query.target_branch {
            params.push(("target_branch", branch.clone()));
        }

        let mrs: Vec<MergeRequest> = self.get_all_pages(&url, &params).await?;
        debug!(count = mrs.len(), "listed open MRs");
        Ok(mrs)
    }

    async fn get_merge_request(&self, iid: u64) -> Result<MergeRequest> {
        debug!(mr_iid = iid, "getting MR");
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests/{}",
            self.encoded_project(),
            iid
        ));
        self.get_json(&url).await
    }

    async fn get_commit(&self, project_id: u64, sha: &str) -> Result<Commit> {
        debug!(project_id, sha, "getting commit");
        let url = self.api_url(&format!(
            "/projects/{project_id}/repository/commits/{}",
            urlencoding::encode(sha)
        ));
        self.get_json(&url).await
    }

    async fn list_merge_request_notes(&self, project_id: u64, iid: u64) -> Result<Vec<Note>> {
        debug!(project_id, mr_iid = iid, "listing MR notes");
        let url = self.api_url(&format!(
            "/projects/{project_id}/merge_requests/{iid}/notes"
        ));
        let notes: Vec<Note> = self.get_all_pages(&url, &[]).await?;
        debug!(mr_iid = iid, count = notes.len(), "listed MR notes");
        Ok(notes)
    }

    async fn set_commit_status(
        &self,
        project_id: u64,
        sha: &str,
        status: &CommitStatus,
    ) -> Result<()> {
        debug!(project_id, sha, state = %status.state, "setting commit status");
        let url = self.api_url(&format!(
            "/projects/{project_id}/statuses/{}",
            urlencoding::encode(sha)
        ));

        let payload = CommitStatusPayload {
            state: status.state.to_string(),
            name: &status.name,
            target_url: status.target_url.as_deref(),
        };

        self.client
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;

        Ok(())
    }

    async fn get_project(&self, project_id: u64) -> Result<Project> {
        debug!(project_id, "getting project");
        let url = self.api_url(&format!("/projects/{project_id}"));
        self.get_json(&url).await
    }
}
