//! Environment descriptor persistence.
//!
//! One JSON record per project lives under the per-user state directory, named
//! by a fingerprint of the absolute project path: the first
//! [`FINGERPRINT_LEN`](crate::env::FINGERPRINT_LEN) hex characters of its
//! SHA-256 digest. The fingerprint is stable, filesystem-safe and independent
//! of the path's length or characters.
//!
//! Writes are last-writer-wins. There is no locking; one concurrent user per
//! project is assumed.

mod descriptor;

pub use descriptor::EnvironmentDescriptor;

use crate::env;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::{debug, info};

/// Descriptor store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the project
    #[error("no environment record at {}", .path.display())]
    NotFound { path: PathBuf },

    /// The record exists but does not parse
    #[error("malformed environment record at {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure
    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure
    #[error("failed to serialize environment record")]
    Serialize(#[source] serde_json::Error),

    /// The user's home directory could not be determined
    #[error("could not determine home directory for the state directory")]
    NoHomeDir,
}

impl StoreError {
    /// Whether the record simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Fingerprint of a project directory used as its store key.
pub fn fingerprint(project_dir: &Path) -> String {
    let absolute = std::path::absolute(project_dir).unwrap_or_else(|_| project_dir.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..env::FINGERPRINT_LEN].to_string()
}

/// File-backed store of environment descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    root: PathBuf,
}

impl DescriptorStore {
    /// Store rooted at an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store at the default per-user location (`~/.local/share/envclone`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoHomeDir`] if the home directory is unknown.
    pub fn default_location() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
        Ok(Self::new(env::state_dir_path(&home)))
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `project_dir`.
    pub fn record_path(&self, project_dir: &Path) -> PathBuf {
        self.root.join(format!("{}.json", fingerprint(project_dir)))
    }

    /// Write the descriptor, replacing any previous record for its project.
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory or record cannot be written.
    pub async fn save(&self, descriptor: &EnvironmentDescriptor) -> Result<PathBuf, StoreError> {
        async_fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })?;

        let path = self.record_path(&descriptor.project_dir);
        let data = serde_json::to_vec_pretty(descriptor).map_err(StoreError::Serialize)?;

        let temp = self
            .root
            .join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        async_fs::write(&temp, &data)
            .await
            .map_err(|source| StoreError::Io {
                path: temp.clone(),
                source,
            })?;
        if let Err(source) = async_fs::rename(&temp, &path).await {
            let _ = async_fs::remove_file(&temp).await;
            return Err(StoreError::Io { path, source });
        }

        info!(
            "Saved environment for {} to {}",
            descriptor.project_name,
            path.display()
        );
        Ok(path)
    }

    /// Read the descriptor for `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists and
    /// [`StoreError::Malformed`] when it cannot be parsed.
    pub async fn load(&self, project_dir: &Path) -> Result<EnvironmentDescriptor, StoreError> {
        let path = self.record_path(project_dir);
        debug!("Loading environment record: {}", path.display());

        let data = match async_fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { path });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&data).map_err(|source| StoreError::Malformed { path, source })
    }

    /// Delete the descriptor for `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists.
    pub async fn remove(&self, project_dir: &Path) -> Result<(), StoreError> {
        let path = self.record_path(project_dir);
        match async_fs::remove_file(&path).await {
            Ok(()) => {
                info!("Removed environment record: {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound { path }),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
