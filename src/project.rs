//! Per-project identity and labeling scheme.
//!
//! A [`ProjectIdentity`] is built once per invocation and every label, engine
//! filter, container name and image tag is derived from it, so creation-time
//! and query-time labels cannot drift apart.

use crate::env;
use crate::state::{EnvironmentDescriptor, fingerprint};
use std::fmt;
use std::path::Path;

/// Opaque key scoping every container that belongs to one project.
///
/// The key is the directory base name followed by a short hash of the
/// absolute path (`api-79949073`), so two checkouts named `api` in different
/// places never share labels, container names or image tags. The base name is
/// kept separately for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectIdentity {
    name: String,
    key: String,
}

impl ProjectIdentity {
    /// Derive the identity from a project directory.
    pub fn from_project_dir(project_dir: &Path) -> Self {
        let name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "project".to_string());
        let hash = fingerprint(project_dir);
        let key = format!("{}-{}", name, &hash[..env::PROJECT_KEY_HASH_LEN]);
        Self { name, key }
    }

    /// Recover the identity recorded in a descriptor.
    ///
    /// Records written before the key was stored carry only the name, which
    /// was the key those environments were labeled with.
    pub fn from_descriptor(descriptor: &EnvironmentDescriptor) -> Self {
        let key = if descriptor.project_key.is_empty() {
            descriptor.project_name.clone()
        } else {
            descriptor.project_key.clone()
        };
        Self {
            name: descriptor.project_name.clone(),
            key,
        }
    }

    /// Directory base name, for display and hostnames.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used in labels, container names and image tags.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// `envclone.project=<key>`
    pub fn label(&self) -> String {
        format!("{}={}", env::PROJECT_LABEL_KEY, self.key)
    }

    /// Engine filter selecting every container of this project.
    pub fn label_filter(&self) -> String {
        format!("label={}", self.label())
    }

    /// Name of the dev container.
    pub fn dev_container(&self) -> String {
        self.container_name("dev")
    }

    /// Name of the network namespace anchor.
    pub fn anchor_container(&self) -> String {
        self.container_name("netns")
    }

    /// Name of a service container.
    pub fn service_container(&self, service: &str) -> String {
        self.container_name(service)
    }

    /// Tag of the image built from the project's Dockerfile.
    pub fn image_tag(&self) -> String {
        format!("{}-{}:latest", env::APP_NAME, self.key)
    }

    fn container_name(&self, suffix: &str) -> String {
        format!("{}-{}-{}", env::APP_NAME, self.key, suffix)
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Role a container plays inside an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Interactive development container
    Dev,
    /// Sidecar service
    Service,
    /// Network namespace anchor
    NetNs,
    /// Missing or unrecognised role label
    Unknown,
}

impl Role {
    /// Value stored in the role label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Dev => "dev",
            Role::Service => "service",
            Role::NetNs => "netns",
            Role::Unknown => "unknown",
        }
    }

    /// `envclone.role=<role>`
    pub fn label(&self) -> String {
        format!("{}={}", env::ROLE_LABEL_KEY, self.as_str())
    }

    /// Parse a role label value. Anything unrecognised is [`Role::Unknown`].
    pub fn from_label_value(value: &str) -> Self {
        match value {
            "dev" => Role::Dev,
            "service" => Role::Service,
            "netns" => Role::NetNs,
            _ => Role::Unknown,
        }
    }

    /// Classify from an engine label list (`k=v,k=v`), reading only the role key.
    pub fn from_labels(labels: &str) -> Self {
        labels
            .split(',')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == env::ROLE_LABEL_KEY)
            .map(|(_, value)| Role::from_label_value(value))
            .unwrap_or(Role::Unknown)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
