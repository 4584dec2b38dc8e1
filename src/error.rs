//! Error types for gitlab-mr-resource

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the check and in operations
#[derive(Debug, Error)]
pub enum Error {
    /// Repository URI does not match `<scheme>://<host>/<project>.git`
    #[error("invalid repository uri: {0}")]
    InvalidUri(String),

    /// Source configuration cannot be resolved
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing key, ssh config or netrc files failed
    #[error("credential setup failed: {0}")]
    Credentials(String),

    /// GitLab API returned an error status
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding/decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A git subprocess exited unsuccessfully or could not be spawned
    #[error("executing git {command}: {message}")]
    Git {
        /// Arguments passed to git, space separated
        command: String,
        /// Exit status or spawn failure
        message: String,
    },

    /// A named step failed; `step` is a short human description
    ///
    /// Displays only the step; the cause is the error's `source()`.
    #[error("{step}")]
    Step {
        /// What was being done, e.g. "getting merge request"
        step: &'static str,
        /// Underlying failure
        #[source]
        source: Box<Self>,
    },
}

impl Error {
    /// Short description of the failing step, if one was attached
    pub const fn step(&self) -> Option<&'static str> {
        match self {
            Self::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Attach a step description to a failing result
pub trait StepContext<T> {
    /// Wrap the error in [`Error::Step`]
    fn step(self, step: &'static str) -> Result<T>;
}

impl<T, E> StepContext<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn step(self, step: &'static str) -> Result<T> {
        self.map_err(|e| Error::Step {
            step,
            source: Box::new(e.into()),
        })
    }
}
