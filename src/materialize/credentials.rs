//! Credential material for git transport
//!
//! Authenticated clone URLs, the netrc file used by submodule fetches, and
//! owner-only file writing shared with the SSH setup.

use crate::error::{Error, Result};
use crate::types::{Project, SubmoduleCredential};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

/// User name GitLab accepts alongside a token for HTTPS clones
pub const TOKEN_USER: &str = "gitlab-ci-token";

/// File name of the netrc written into the home directory
const NETRC_FILE: &str = ".netrc";

/// Clone URL for a project
///
/// The SSH URL when SSH is configured, otherwise the HTTPS URL with the token
/// embedded as user info.
pub fn repository_url(project: &Project, token: &str, use_ssh: bool) -> Result<String> {
    if use_ssh {
        return Ok(project.ssh_url_to_repo.clone());
    }

    let mut url = Url::parse(&project.http_url_to_repo).map_err(|e| {
        Error::Config(format!(
            "invalid http_url_to_repo {:?}: {e}",
            project.http_url_to_repo
        ))
    })?;

    url.set_username(TOKEN_USER)
        .and_then(|()| url.set_password(Some(token)))
        .map_err(|()| {
            Error::Config(format!(
                "cannot embed credentials in {:?}",
                project.http_url_to_repo
            ))
        })?;

    Ok(url.to_string())
}

/// netrc lines, one per credential
pub fn netrc_contents(credentials: &[SubmoduleCredential]) -> String {
    credentials
        .iter()
        .map(|c| {
            format!(
                "machine {} login {} password {}\n",
                c.host, c.username, c.password
            )
        })
        .collect()
}

/// Write `~/.netrc` for the submodule hosts
pub fn write_netrc(home: &Path, credentials: &[SubmoduleCredential]) -> Result<PathBuf> {
    let path = home.join(NETRC_FILE);
    write_private_file(&path, netrc_contents(credentials).as_bytes())?;
    Ok(path)
}

/// Create or truncate `path` with owner-only permissions and write `contents`
pub(crate) fn write_private_file(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .map_err(|e| Error::Credentials(format!("failed to create {}: {e}", path.display())))?;

    // mode() only applies to new files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::Credentials(format!("failed to restrict {}: {e}", path.display())))?;
    }

    file.write_all(contents)
        .map_err(|e| Error::Credentials(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}
