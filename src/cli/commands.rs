//! Subcommand handlers.
//!
//! [`App`] wires settings, platform, runner and descriptor store together and
//! runs one subcommand. Handlers return the text destined for stdout; logs go
//! through `tracing`.

use super::args::Commands;
use crate::config::{self, DevContainerConfig};
use crate::container::{ContainerInfo, ContainerManager};
use crate::env;
use crate::error::EnvError;
use crate::platform::Platform;
use crate::project::ProjectIdentity;
use crate::runner::ProcessRunner;
use crate::settings::{Settings, find_settings_file};
use crate::ssh;
use crate::state::{DescriptorStore, EnvironmentDescriptor};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Printed by `status` when the project has no environment.
pub const NO_ENVIRONMENT: &str = "No environment running.";

/// One CLI invocation's wiring.
pub struct App {
    settings: Settings,
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
    store: DescriptorStore,
    project_dir: PathBuf,
    dry_run: bool,
}

impl App {
    pub fn new(
        settings: Settings,
        platform: Platform,
        runner: Arc<dyn ProcessRunner>,
        store: DescriptorStore,
        project_dir: PathBuf,
    ) -> Self {
        Self {
            settings,
            platform,
            runner,
            store,
            project_dir,
            dry_run: false,
        }
    }

    /// Skip readiness checks and descriptor writes.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run `command` and return its stdout text.
    pub async fn execute(&self, command: &Commands) -> Result<String> {
        let output = match command {
            Commands::Init => self.init()?,
            Commands::Up => self.up().await?,
            Commands::Down => self.down().await?,
            Commands::Status => self.status().await?,
            Commands::Shell => self.shell().await?,
            Commands::Exec { cmd } => self.exec(cmd).await?,
            Commands::SshConfig { write } => self.ssh_config(*write).await?,
            Commands::ShowConfig => self.show_config(),
        };
        self.platform.cleanup().await?;
        Ok(output)
    }

    fn manager(&self) -> ContainerManager {
        ContainerManager::new(self.platform.clone(), self.runner.clone(), &self.project_dir)
    }

    async fn load_descriptor(&self) -> Result<EnvironmentDescriptor, EnvError> {
        self.store.load(&self.project_dir).await.map_err(|err| {
            if err.is_not_found() {
                EnvError::NoEnvironment(err)
            } else {
                EnvError::Store(err)
            }
        })
    }

    fn init(&self) -> Result<String> {
        let path = config::write_template(&self.project_dir)?;
        Ok(format!("Created {}", path.display()))
    }

    async fn up(&self) -> Result<String> {
        let config = DevContainerConfig::load(&self.project_dir)?;

        if self.dry_run {
            info!("dry run, skipping runtime readiness check");
        } else {
            self.platform.ensure_runtime(self.runner.as_ref()).await?;
        }

        let manager = self.manager();
        let descriptor = manager.up(&config).await?;

        if !self.dry_run {
            self.store.save(&descriptor).await?;
        }

        Ok(format!(
            "Environment {} is up on {}\n  dev container: {}\n  services: {}\n  ssh: ssh {} (port {})",
            descriptor.project_name,
            self.platform.name(),
            manager.project().dev_container(),
            descriptor.service_ids.len(),
            ssh::host_alias(&descriptor),
            descriptor.ssh_port,
        ))
    }

    async fn down(&self) -> Result<String> {
        let descriptor = self.load_descriptor().await?;
        self.manager().down(&descriptor).await?;

        if !self.dry_run {
            self.store.remove(&self.project_dir).await?;
        }
        Ok(format!("Environment {} removed", descriptor.project_name))
    }

    async fn status(&self) -> Result<String> {
        let descriptor = match self.load_descriptor().await {
            Ok(descriptor) => descriptor,
            Err(EnvError::NoEnvironment(_)) => return Ok(NO_ENVIRONMENT.to_string()),
            Err(err) => return Err(err.into()),
        };
        let infos = self.manager().status(&descriptor).await?;
        Ok(render_status(&infos))
    }

    async fn ensure_running(&self) -> Result<EnvironmentDescriptor, EnvError> {
        let descriptor = self.load_descriptor().await?;
        if !self.dry_run && !self.manager().is_running(&descriptor).await {
            let name = ProjectIdentity::from_descriptor(&descriptor).dev_container();
            return Err(EnvError::NotRunning(name));
        }
        Ok(descriptor)
    }

    async fn shell(&self) -> Result<String> {
        let descriptor = self.ensure_running().await?;
        self.manager().shell(&descriptor).await?;
        Ok(String::new())
    }

    async fn exec(&self, argv: &[String]) -> Result<String> {
        if argv.is_empty() {
            return Err(EnvError::EmptyCommand.into());
        }
        let descriptor = self.ensure_running().await?;
        self.manager().exec(&descriptor, argv).await?;
        Ok(String::new())
    }

    async fn ssh_config(&self, write: bool) -> Result<String> {
        let descriptor = self.load_descriptor().await?;
        if !write {
            return Ok(ssh::config_block(&descriptor).trim_end().to_string());
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        let path = env::ssh_config_file_path(&home);
        ssh::write_ssh_config(&path, &descriptor)?;
        Ok(format!(
            "Wrote host {} to {}",
            ssh::host_alias(&descriptor),
            path.display()
        ))
    }

    fn show_config(&self) -> String {
        let cwd = std::env::current_dir().ok();
        let config_dir = dirs::config_dir();
        discovery_report(
            &self.settings,
            &self.store,
            &self.project_dir,
            cwd.as_deref(),
            config_dir.as_deref(),
        )
    }
}

/// Render the `status` table.
pub fn render_status(infos: &[ContainerInfo]) -> String {
    if infos.is_empty() {
        return NO_ENVIRONMENT.to_string();
    }

    let width = infos
        .iter()
        .map(|i| i.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!("{:<width$}  {:<8}  STATUS", "NAME", "ROLE", width = width);
    for info in infos {
        let _ = write!(
            out,
            "\n{:<width$}  {:<8}  {}",
            info.name,
            info.role.as_str(),
            info.status,
            width = width
        );
    }
    out
}

/// Describe where settings come from and what is in effect.
pub fn discovery_report(
    settings: &Settings,
    store: &DescriptorStore,
    project_dir: &Path,
    current_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> String {
    let mut out = String::from("Settings discovery:\n");
    let candidates = current_dir
        .map(env::local_settings_file_path)
        .into_iter()
        .chain(config_dir.map(env::user_settings_file_path));
    for (i, candidate) in candidates.enumerate() {
        let state = if candidate.is_file() { "found" } else { "not found" };
        let _ = writeln!(out, "  {}. {} - {}", i + 1, candidate.display(), state);
    }

    let active = find_settings_file(current_dir, config_dir)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    let _ = writeln!(out, "Active settings: {}", active);
    let _ = writeln!(out, "  ssh_port = {}", settings.ssh_port);
    let _ = writeln!(out, "  vm_name = {}", settings.vm_name);
    let _ = writeln!(out, "  log_filter = {}", settings.log_filter);
    let _ = writeln!(out, "State directory: {}", store.root().display());
    let _ = write!(
        out,
        "Environment record: {}",
        store.record_path(project_dir).display()
    );
    out
}
