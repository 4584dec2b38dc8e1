//! SSH transport provisioning
//!
//! Writes the private key and a client config to `~/.ssh` so git can clone
//! over SSH without prompting.

use crate::error::{Error, Result};
use crate::materialize::credentials::write_private_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key file name inside `~/.ssh`
const KEY_FILE: &str = "privkey";

/// Client config file name inside `~/.ssh`
const CONFIG_FILE: &str = "config";

/// Files written by [`setup_ssh_key`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSetup {
    /// Private key path
    pub key_path: PathBuf,
    /// Client config path
    pub config_path: PathBuf,
}

/// Client config disabling host key prompts and pinning the key for `host`
pub fn ssh_config(host: &str, key_path: &Path) -> String {
    format!(
        "StrictHostKeyChecking no\nLogLevel quiet\n\nHost {host}\n    IdentityFile {}\n",
        key_path.display()
    )
}

/// Write the private key and client config under `home/.ssh`
pub fn setup_ssh_key(home: &Path, private_key: &str, host: &str) -> Result<SshSetup> {
    let ssh_dir = home.join(".ssh");
    create_ssh_dir(&ssh_dir)?;

    // OpenSSH rejects keys without a trailing newline
    let mut key = private_key.to_string();
    if !key.ends_with('\n') {
        key.push('\n');
    }

    let key_path = ssh_dir.join(KEY_FILE);
    write_private_file(&key_path, key.as_bytes())?;

    let config_path = ssh_dir.join(CONFIG_FILE);
    write_private_file(&config_path, ssh_config(host, &key_path).as_bytes())?;

    debug!(host, key = %key_path.display(), "ssh key installed");
    Ok(SshSetup {
        key_path,
        config_path,
    })
}

fn create_ssh_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .map_err(|e| Error::Credentials(format!("failed to create {}: {e}", dir.display())))
}
