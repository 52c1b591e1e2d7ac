//! Tool settings discovery and loading
//!
//! Settings are read from the first file found in this order:
//! 1. Current directory: ./envclone.toml
//! 2. User config: <config dir>/envclone/config.toml
//! 3. Built-in defaults

use crate::env;
use crate::state::{DescriptorStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings loading errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("reading settings file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing settings file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// User-tunable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Descriptor directory; `~/.local/share/envclone` when unset
    pub state_dir: Option<PathBuf>,
    /// Host port published for SSH
    pub ssh_port: u16,
    /// Lima VM hosting the engine on macOS
    pub vm_name: String,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_dir: None,
            ssh_port: env::DEFAULT_SSH_PORT,
            vm_name: env::DEFAULT_VM_NAME.to_string(),
            log_filter: format!("{}=info", env::APP_NAME),
        }
    }
}

impl Settings {
    /// Load from TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Discover settings for the current process.
    pub fn discover() -> Result<Self, SettingsError> {
        let cwd = std::env::current_dir().ok();
        let config_dir = dirs::config_dir();
        Self::discover_from(cwd.as_deref(), config_dir.as_deref())
    }

    /// Discover settings from explicit directories.
    pub fn discover_from(
        current_dir: Option<&Path>,
        config_dir: Option<&Path>,
    ) -> Result<Self, SettingsError> {
        match find_settings_file(current_dir, config_dir) {
            Some(path) => {
                info!("Loading settings from: {}", path.display());
                Self::from_toml_file(&path)
            }
            None => {
                debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Descriptor store honoring `state_dir`.
    pub fn descriptor_store(&self) -> Result<DescriptorStore, StoreError> {
        match &self.state_dir {
            Some(dir) => Ok(DescriptorStore::new(dir)),
            None => DescriptorStore::default_location(),
        }
    }
}

/// First existing settings file in discovery order.
pub fn find_settings_file(current_dir: Option<&Path>, config_dir: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(dir) = current_dir {
        candidates.push(env::local_settings_file_path(dir));
    }
    if let Some(dir) = config_dir {
        candidates.push(env::user_settings_file_path(dir));
    }

    candidates.into_iter().find(|candidate| {
        debug!("Checking for settings file: {}", candidate.display());
        candidate.is_file()
    })
}
