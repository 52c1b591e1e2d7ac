//! SSH client config integration.
//!
//! Each environment gets a marker-delimited `Host` block in `~/.ssh/config`
//! pointing at the anchor's published port, so editors can attach with
//! `ssh envclone-<project key>`.

use crate::env;
use crate::project::ProjectIdentity;
use crate::state::EnvironmentDescriptor;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

fn alias_key(descriptor: &EnvironmentDescriptor) -> String {
    ProjectIdentity::from_descriptor(descriptor).key().to_string()
}

/// SSH host alias for an environment.
pub fn host_alias(descriptor: &EnvironmentDescriptor) -> String {
    format!("{}-{}", env::APP_NAME, alias_key(descriptor))
}

fn begin_marker(key: &str) -> String {
    format!("# --- {}: {} ---", env::APP_NAME, key)
}

fn end_marker(key: &str) -> String {
    format!("# --- /{}: {} ---", env::APP_NAME, key)
}

/// Render the config block for an environment, markers included.
pub fn config_block(descriptor: &EnvironmentDescriptor) -> String {
    let key = alias_key(descriptor);
    format!(
        "{begin}\n\
         Host {alias}\n\
         \x20   HostName localhost\n\
         \x20   Port {port}\n\
         \x20   User {user}\n\
         \x20   StrictHostKeyChecking no\n\
         \x20   UserKnownHostsFile /dev/null\n\
         {end}\n",
        begin = begin_marker(&key),
        alias = host_alias(descriptor),
        port = descriptor.ssh_port,
        user = descriptor.remote_user,
        end = end_marker(&key),
    )
}

/// Replace the environment's block in `existing`, or append it.
pub fn upsert_block(existing: &str, descriptor: &EnvironmentDescriptor) -> String {
    let block = config_block(descriptor);
    let key = alias_key(descriptor);
    let begin = begin_marker(&key);
    let end = end_marker(&key);

    if let Some(start) = existing.find(&begin) {
        if let Some(offset) = existing[start..].find(&end) {
            let mut stop = start + offset + end.len();
            if existing[stop..].starts_with('\n') {
                stop += 1;
            }
            return format!("{}{}{}", &existing[..start], block, &existing[stop..]);
        }
    }

    if existing.is_empty() {
        return block;
    }
    let separator = if existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    format!("{}{}{}", existing, separator, block)
}

/// Write the environment's block into the SSH config at `path`.
pub fn write_ssh_config(path: &Path, descriptor: &EnvironmentDescriptor) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, upsert_block(&existing, descriptor))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Updated {} with host {}",
        path.display(),
        host_alias(descriptor)
    );
    Ok(())
}
