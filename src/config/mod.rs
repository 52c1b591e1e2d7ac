//! Devcontainer configuration loading.
//!
//! Reads `<project>/.devcontainer/devcontainer.json` and performs the
//! validation the orchestrator relies on: an image or a build spec must be
//! present, and a build spec must name a Dockerfile.

use crate::env;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Template written by `envclone init`.
pub const INIT_TEMPLATE: &str = include_str!("init_template.json");

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("reading {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the schema
    #[error("parsing {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The config parsed but is unusable
    #[error("devcontainer.json: {0}")]
    Invalid(String),

    /// `init` would overwrite an existing config
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Writing the template failed
    #[error("writing {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Image build declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Dockerfile path, relative to `.devcontainer` unless absolute
    pub dockerfile: String,
    /// Build context, relative to `.devcontainer` unless absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Sidecar service declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Unique name within the environment
    pub name: String,
    /// Image to run
    pub image: String,
    /// Declared ports; reachable through the shared namespace, never published
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// `KEY=VALUE` assignments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    /// Engine `-v` volume specs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
}

/// Parsed `devcontainer.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevContainerConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_mount: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forward_ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_create_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_start_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceConfig>,
}

impl DevContainerConfig {
    /// Load and validate the config of `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, malformed or fails validation.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = env::devcontainer_file_path(project_dir);
        debug!("Loading devcontainer config: {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path, source })?;

        config.validated(project_dir)
    }

    /// Apply validation and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when neither image nor build is set,
    /// or when the build Dockerfile is empty.
    pub fn validated(mut self, project_dir: &Path) -> Result<Self, ConfigError> {
        if non_empty(&self.image).is_none() && self.build.is_none() {
            return Err(ConfigError::Invalid(
                "either \"image\" or \"build.dockerfile\" is required".to_string(),
            ));
        }
        if let Some(build) = &self.build {
            if build.dockerfile.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "\"build.dockerfile\" cannot be empty".to_string(),
                ));
            }
        }
        if self.name.is_empty() {
            self.name = project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(self)
    }

    /// Host directory mounted as the workspace.
    pub fn workspace_host_path(&self, project_dir: &Path) -> PathBuf {
        non_empty(&self.workspace_folder)
            .map(PathBuf::from)
            .unwrap_or_else(|| project_dir.to_path_buf())
    }

    /// Mount point of the workspace inside the dev container.
    pub fn workspace_mount_target(&self) -> &str {
        non_empty(&self.workspace_mount).unwrap_or(env::DEFAULT_WORKSPACE_MOUNT)
    }

    /// Effective remote user.
    pub fn effective_remote_user(&self) -> &str {
        non_empty(&self.remote_user).unwrap_or(env::DEFAULT_REMOTE_USER)
    }

    /// Declared post-create command, if any.
    pub fn post_create(&self) -> Option<&str> {
        non_empty(&self.post_create_command)
    }

    /// Declared post-start command, if any.
    pub fn post_start(&self) -> Option<&str> {
        non_empty(&self.post_start_command)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Write the starter `devcontainer.json` into `project_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] rather than overwriting a config.
pub fn write_template(project_dir: &Path) -> Result<PathBuf, ConfigError> {
    let dir = env::devcontainer_dir_path(project_dir);
    let path = env::devcontainer_file_path(project_dir);

    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
        path: dir.clone(),
        source,
    })?;
    std::fs::write(&path, INIT_TEMPLATE).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;

    info!("Created {}", path.display());
    Ok(path)
}
