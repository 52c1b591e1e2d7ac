//! # envclone
//!
//! Per-project development environments on containerd and nerdctl. Each
//! project gets a dev container, optional sidecar services and a network
//! namespace anchor that publishes SSH, all scoped by a project label so
//! environments never touch each other.
//!
//! ## Architecture Overview
//!
//! - **[`runner`]**: The single boundary where host processes are spawned
//! - **[`platform`]**: Host differences (direct engine on Linux, Lima VM bridge on macOS)
//! - **[`network`]**: Shared network namespace anchors
//! - **[`container`]**: Environment lifecycle (`up`, `down`, `status`, `shell`, `exec`)
//! - **[`state`]**: Environment descriptors persisted per project
//! - **[`config`]**: `devcontainer.json` loading and validation
//! - **[`settings`]**: Tool settings discovery
//! - **[`ssh`]**: SSH client config entries
//! - **[`cli`]**: Argument parsing and subcommand handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use envclone::cli::{App, Commands};
//! use envclone::platform::{HostFacts, Platform};
//! use envclone::runner::HostRunner;
//! use envclone::settings::Settings;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::discover()?;
//!     let platform = Platform::detect(&HostFacts::gather(), &settings)?;
//!     let store = settings.descriptor_store()?;
//!     let app = App::new(
//!         settings,
//!         platform,
//!         Arc::new(HostRunner::new()),
//!         store,
//!         std::env::current_dir()?,
//!     );
//!
//!     println!("{}", app.execute(&Commands::Up).await?);
//!     Ok(())
//! }
//! ```

/// Command line interface.
pub mod cli;

/// Devcontainer configuration.
pub mod config;

/// Container lifecycle orchestration.
///
/// Builds engine invocations from a devcontainer declaration and drives the
/// environment through creation, inspection and teardown.
pub mod container;

/// Environment constants and path utilities.
pub mod env;

/// Lifecycle errors and the failure policy.
pub mod error;

/// Shared network namespace anchors.
pub mod network;

/// Host platform capability layer.
pub mod platform;

/// Per-project identity and role labels.
pub mod project;

/// External process execution.
pub mod runner;

/// Tool settings discovery.
pub mod settings;

/// SSH client config entries.
pub mod ssh;

/// Environment descriptor persistence.
pub mod state;

pub use config::DevContainerConfig;
pub use container::{ContainerInfo, ContainerManager};
pub use error::{EnvError, Severity};
pub use platform::{HostFacts, Platform, PlatformError};
pub use project::{ProjectIdentity, Role};
pub use runner::{CommandLine, HostRunner, ProcessRunner, RunnerError};
pub use settings::Settings;
pub use state::{DescriptorStore, EnvironmentDescriptor, StoreError};
