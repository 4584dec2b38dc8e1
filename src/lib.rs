//! gitlab-mr-resource - a pipeline resource for GitLab merge requests
//!
//! `check` discovers merge requests with new activity since the last emitted
//! version and marks them pending; `in` materializes one of them as the
//! target branch with the merge request merged in, uncommitted.

pub mod check;
pub mod config;
pub mod error;
pub mod logging;
pub mod materialize;
pub mod platform;
pub mod types;
