//! Environment lifecycle orchestration.
//!
//! [`ContainerManager`] drives one project's environment through the engine:
//! clearing stale containers, building the image, starting the namespace
//! anchor, services and dev container, and tearing them down by label.

use super::{BuildPlan, ContainerInfo, RunSpec};
use crate::config::DevContainerConfig;
use crate::env;
use crate::error::{EnvError, Result, Severity, fatal};
use crate::network::NamespaceProvisioner;
use crate::platform::Platform;
use crate::project::{ProjectIdentity, Role};
use crate::runner::{ProcessRunner, RunnerError};
use crate::state::EnvironmentDescriptor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ID_FORMAT: &str = "{{.ID}}";
const STATUS_FORMAT: &str = "{{.Names}}\t{{.Labels}}\t{{.Status}}";
const RUNNING_FORMAT: &str = "{{.State.Running}}";

/// Lifecycle driver for one project's environment.
pub struct ContainerManager {
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
    project_dir: PathBuf,
    project: ProjectIdentity,
    namespace: NamespaceProvisioner,
}

impl ContainerManager {
    /// Create a manager for `project_dir`.
    pub fn new(platform: Platform, runner: Arc<dyn ProcessRunner>, project_dir: &Path) -> Self {
        let namespace = NamespaceProvisioner::new(platform.clone(), runner.clone());
        Self {
            project: ProjectIdentity::from_project_dir(project_dir),
            project_dir: project_dir.to_path_buf(),
            platform,
            runner,
            namespace,
        }
    }

    /// Identity every container of this environment is labeled with.
    pub fn project(&self) -> &ProjectIdentity {
        &self.project
    }

    /// Bring the environment up from scratch.
    ///
    /// Any containers left by a previous run are removed first, so repeated
    /// calls converge on one anchor, one dev container and one container per
    /// service. The returned descriptor is not persisted here.
    ///
    /// # Errors
    ///
    /// Fails on the first build, anchor, service or dev container failure.
    /// Containers created before the failure are left in place; the next `up`
    /// or `down` removes them.
    pub async fn up(&self, config: &DevContainerConfig) -> Result<EnvironmentDescriptor> {
        info!("Bringing up environment for {}", self.project);

        let stale = self.remove_existing().await;
        Severity::BestEffort.settle("removing stale containers", stale)?;
        let anchor = self.namespace.remove(&self.project).await;
        Severity::BestEffort.settle("removing stale network namespace container", anchor)?;

        let image = match &config.build {
            Some(build) => {
                let plan = BuildPlan::resolve(&self.project_dir, build, &self.project);
                info!("Building image {}", plan.tag);
                fatal(
                    format!("building image {}", plan.tag),
                    self.engine(plan.to_args()).await,
                )?;
                plan.tag
            }
            None => config.image.clone().unwrap_or_default(),
        };

        let ssh_port = self.platform.ssh_port();
        let net_anchor_id = fatal(
            "creating network namespace container",
            self.namespace.create(&self.project, ssh_port).await,
        )?;
        let network = NamespaceProvisioner::attach_mode(&self.project);

        let mut service_ids = Vec::with_capacity(config.services.len());
        for service in &config.services {
            let spec = RunSpec::new(self.project.service_container(&service.name), &service.image)
                .label(self.project.label())
                .label(Role::Service.label())
                .network(&network)
                .envs(&service.env);
            let spec = service
                .volumes
                .iter()
                .fold(spec, |spec, volume| spec.volume(volume));

            let id = fatal(
                format!("creating service container {}", service.name),
                self.engine(spec.to_args()).await,
            )?;
            info!("Started service {} ({})", service.name, id);
            service_ids.push(id);
        }

        let host_path = config.workspace_host_path(&self.project_dir);
        let mount = config.workspace_mount_target();
        let dev = RunSpec::new(self.project.dev_container(), image)
            .label(self.project.label())
            .label(Role::Dev.label())
            .network(&network)
            .mount_args(
                self.platform
                    .mount_args(&host_path.to_string_lossy(), mount),
            )
            .working_dir(mount)
            .init()
            .extra_args(&config.run_args)
            .cmd(env::IDLE_ENTRYPOINT);
        let dev_container_id = fatal(
            "creating dev container",
            self.engine(dev.to_args()).await,
        )?;
        info!("Started dev container {} ({})", dev.name(), dev_container_id);

        if let Some(command) = config.post_create() {
            let result = self.run_in_dev(command).await;
            Severity::Warning.settle("postCreateCommand", result)?;
        }
        if let Some(command) = config.post_start() {
            let result = self.run_in_dev(command).await;
            Severity::Warning.settle("postStartCommand", result)?;
        }

        Ok(EnvironmentDescriptor {
            project_name: self.project.name().to_string(),
            project_key: self.project.key().to_string(),
            project_dir: self.project_dir.clone(),
            dev_container_id,
            net_anchor_id,
            service_ids,
            ssh_port,
            remote_user: config.effective_remote_user().to_string(),
        })
    }

    /// Remove every container labeled with the descriptor's project.
    ///
    /// # Errors
    ///
    /// Fails if the containers cannot be listed or removed.
    pub async fn down(&self, descriptor: &EnvironmentDescriptor) -> Result<()> {
        let project = ProjectIdentity::from_descriptor(descriptor);
        info!("Tearing down environment for {}", project);

        let ids = fatal("listing containers", self.list_ids(&project).await)?;
        if ids.is_empty() {
            debug!("No containers found for {}", project);
            return Ok(());
        }

        let mut args = vec!["rm".to_string(), "-f".to_string()];
        args.extend(ids);
        fatal("removing containers", self.engine(args).await)?;
        Ok(())
    }

    /// List the environment's containers with role and engine status.
    ///
    /// # Errors
    ///
    /// Fails if the engine listing fails.
    pub async fn status(&self, descriptor: &EnvironmentDescriptor) -> Result<Vec<ContainerInfo>> {
        let project = ProjectIdentity::from_descriptor(descriptor);
        let output = fatal(
            "listing containers",
            self.engine([
                "ps".to_string(),
                "-a".to_string(),
                "--filter".to_string(),
                project.label_filter(),
                "--format".to_string(),
                STATUS_FORMAT.to_string(),
            ])
            .await,
        )?;

        Ok(output.lines().filter_map(ContainerInfo::parse_line).collect())
    }

    /// Whether the dev container is running. Any failure counts as not running.
    pub async fn is_running(&self, descriptor: &EnvironmentDescriptor) -> bool {
        let name = ProjectIdentity::from_descriptor(descriptor).dev_container();
        let result = self
            .engine([
                "inspect".to_string(),
                "--format".to_string(),
                RUNNING_FORMAT.to_string(),
                name.clone(),
            ])
            .await;

        match result {
            Ok(output) => output.trim() == "true",
            Err(err) => {
                debug!("inspect {} failed: {}", name, err);
                false
            }
        }
    }

    /// Attach an interactive login shell to the dev container.
    ///
    /// # Errors
    ///
    /// Fails if the engine exec fails or the shell exits non-zero.
    pub async fn shell(&self, descriptor: &EnvironmentDescriptor) -> Result<()> {
        let name = ProjectIdentity::from_descriptor(descriptor).dev_container();
        let cmd = self.platform.engine([
            "exec".to_string(),
            "-it".to_string(),
            name,
            env::LOGIN_SHELL.to_string(),
        ]);
        fatal("opening shell", self.runner.run_interactive(&cmd).await)
    }

    /// Run `argv` in the dev container with the caller's terminal attached.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::EmptyCommand`] for an empty `argv`, otherwise the
    /// engine failure.
    pub async fn exec(&self, descriptor: &EnvironmentDescriptor, argv: &[String]) -> Result<()> {
        if argv.is_empty() {
            return Err(EnvError::EmptyCommand);
        }

        let name = ProjectIdentity::from_descriptor(descriptor).dev_container();
        let mut args = vec!["exec".to_string(), name];
        args.extend(argv.iter().cloned());
        let cmd = self.platform.engine(args);
        fatal(
            format!("running {}", argv.join(" ")),
            self.runner.run_interactive(&cmd).await,
        )
    }

    async fn remove_existing(&self) -> std::result::Result<(), RunnerError> {
        let ids = self.list_ids(&self.project).await?;
        if ids.is_empty() {
            return Ok(());
        }
        debug!("Removing {} stale containers for {}", ids.len(), self.project);
        let mut args = vec!["rm".to_string(), "-f".to_string()];
        args.extend(ids);
        self.engine(args).await.map(|_| ())
    }

    async fn list_ids(&self, project: &ProjectIdentity) -> std::result::Result<Vec<String>, RunnerError> {
        let output = self
            .engine([
                "ps".to_string(),
                "-a".to_string(),
                "--filter".to_string(),
                project.label_filter(),
                "--format".to_string(),
                ID_FORMAT.to_string(),
            ])
            .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn run_in_dev(&self, command: &str) -> std::result::Result<String, RunnerError> {
        debug!("Running in dev container: {}", command);
        self.engine([
            "exec".to_string(),
            self.project.dev_container(),
            "sh".to_string(),
            "-c".to_string(),
            command.to_string(),
        ])
        .await
    }

    async fn engine<I, S>(&self, args: I) -> std::result::Result<String, RunnerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = self.platform.engine(args);
        self.runner.run(&cmd).await
    }
}
