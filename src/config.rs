//! Configuration resolution
//!
//! Parses the repository URI from the source configuration and resolves the
//! values that fall back to the CI environment. Environment lookups happen
//! once, in [`ExecutionContext::from_env`]; everything else takes the context
//! as a parameter.

use crate::error::{Error, Result};
use crate::types::Source;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?|ssh)://([^/]*)/(.*)\.git$").expect("static pattern compiles")
});

/// Transport scheme of the repository URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `http://`
    Http,
    /// `https://`
    Https,
    /// `ssh://`
    Ssh,
}

/// A parsed `<scheme>://<authority>/<project path>.git` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUri {
    /// Transport scheme
    pub scheme: Scheme,
    /// Authority as written, possibly with `user@` and `:port`
    pub authority: String,
    /// Project path with namespace, e.g. `group/sub/project`
    pub project_path: String,
}

impl RepositoryUri {
    /// Parse a repository URI
    pub fn parse(uri: &str) -> Result<Self> {
        let caps = URI_PATTERN
            .captures(uri.trim())
            .ok_or_else(|| Error::InvalidUri(uri.to_string()))?;

        let scheme = match &caps[1] {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => Scheme::Ssh,
        };
        let authority = caps[2].to_string();
        let project_path = caps[3].to_string();

        if authority.is_empty() || project_path.is_empty() {
            return Err(Error::InvalidUri(uri.to_string()));
        }

        Ok(Self {
            scheme,
            authority,
            project_path,
        })
    }

    /// Authority without user info (`host[:port]`)
    pub fn server_domain(&self) -> &str {
        self.authority
            .rsplit_once('@')
            .map_or(self.authority.as_str(), |(_, host)| host)
    }

    /// Host name without user info or port
    pub fn host(&self) -> &str {
        let domain = self.server_domain();
        domain.split_once(':').map_or(domain, |(host, _)| host)
    }

    /// Base URL of the v4 REST API
    ///
    /// SSH URIs resolve to HTTPS on the same host.
    pub fn api_base_url(&self) -> String {
        match self.scheme {
            Scheme::Http => format!("http://{}/api/v4", self.server_domain()),
            Scheme::Https => format!("https://{}/api/v4", self.server_domain()),
            Scheme::Ssh => format!("https://{}/api/v4", self.host()),
        }
    }
}

/// Values read from the CI environment
///
/// Captured once per invocation so the resolver and materializer never touch
/// the process environment directly.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// `ATC_EXTERNAL_URL`
    pub external_url: Option<String>,
    /// `BUILD_TEAM_NAME`
    pub team_name: Option<String>,
    /// `BUILD_PIPELINE_NAME`
    pub pipeline_name: Option<String>,
    /// `BUILD_JOB_NAME`
    pub job_name: Option<String>,
    /// `BUILD_NAME`
    pub build_name: Option<String>,
    /// Home directory for ssh and netrc files
    pub home_dir: Option<PathBuf>,
}

impl ExecutionContext {
    /// Capture the context from the process environment
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            external_url: var("ATC_EXTERNAL_URL"),
            team_name: var("BUILD_TEAM_NAME"),
            pipeline_name: var("BUILD_PIPELINE_NAME"),
            job_name: var("BUILD_JOB_NAME"),
            build_name: var("BUILD_NAME"),
            home_dir: dirs::home_dir(),
        }
    }

    /// CI server URL: the source setting, else the environment
    pub fn concourse_url<'a>(&'a self, source: &'a Source) -> Option<&'a str> {
        if source.concourse_url.is_empty() {
            self.external_url.as_deref()
        } else {
            Some(source.concourse_url.as_str())
        }
    }

    /// Commit status name: the source setting, else the pipeline name
    pub fn pipeline_name(&self, source: &Source) -> String {
        if source.pipeline_name.is_empty() {
            self.pipeline_name.clone().unwrap_or_default()
        } else {
            source.pipeline_name.clone()
        }
    }

    /// Link to the running build, for commit statuses
    ///
    /// Returns `None` when no CI server URL is known.
    pub fn target_url(&self, source: &Source) -> Result<Option<String>> {
        let Some(base) = self.concourse_url(source) else {
            return Ok(None);
        };

        let mut url = Url::parse(base)
            .map_err(|e| Error::Config(format!("invalid concourse_url {base:?}: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("concourse_url {base:?} cannot be a base")))?
            .pop_if_empty()
            .extend([
                "teams",
                self.team_name.as_deref().unwrap_or_default(),
                "pipelines",
                self.pipeline_name.as_deref().unwrap_or_default(),
                "jobs",
                self.job_name.as_deref().unwrap_or_default(),
                "builds",
                self.build_name.as_deref().unwrap_or_default(),
            ]);

        Ok(Some(url.to_string()))
    }

    /// Home directory, required when writing credential files
    pub fn home(&self) -> Result<&std::path::Path> {
        self.home_dir
            .as_deref()
            .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))
    }
}
