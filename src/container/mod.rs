//! Container orchestration layer.
//!
//! This module turns a devcontainer declaration into engine invocations and
//! owns the lifecycle of one project's containers.
//!
//! - [`manager`]: lifecycle operations (`up`, `down`, `status`, `shell`, `exec`)
//! - [`spec`]: `run` argument builder shared with the namespace anchor
//! - [`build`]: Dockerfile and build context resolution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use envclone::config::DevContainerConfig;
//! use envclone::container::ContainerManager;
//! use envclone::platform::{HostFacts, Platform};
//! use envclone::runner::HostRunner;
//! use envclone::settings::Settings;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let project_dir = Path::new("/home/me/src/api");
//!     let platform = Platform::detect(&HostFacts::gather(), &Settings::default())?;
//!     let manager = ContainerManager::new(platform, Arc::new(HostRunner::new()), project_dir);
//!
//!     let config = DevContainerConfig::load(project_dir)?;
//!     let descriptor = manager.up(&config).await?;
//!     for info in manager.status(&descriptor).await? {
//!         println!("{} {} {}", info.name, info.role, info.status);
//!     }
//!     manager.down(&descriptor).await?;
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod manager;
pub mod spec;

pub use build::BuildPlan;
pub use manager::ContainerManager;
pub use spec::RunSpec;

use crate::project::Role;

/// One container as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub name: String,
    pub role: Role,
    pub status: String,
}

impl ContainerInfo {
    /// Parse a `name<TAB>labels<TAB>status` listing line.
    ///
    /// Returns `None` for lines without all three fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(3, '\t');
        let name = fields.next()?.trim();
        let labels = fields.next()?;
        let status = fields.next()?.trim();

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            role: Role::from_labels(labels),
            status: status.to_string(),
        })
    }
}
