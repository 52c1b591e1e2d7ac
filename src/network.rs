//! Shared network namespace management.
//!
//! Each project gets one long-lived anchor container running the pause image.
//! It owns the network namespace every other project container joins with
//! `--network container:<anchor>`, and it is the only container publishing a
//! host port (SSH), so the dev container stays reachable whichever container
//! ends up running sshd.

use crate::container::RunSpec;
use crate::env;
use crate::platform::Platform;
use crate::project::{ProjectIdentity, Role};
use crate::runner::{ProcessRunner, RunnerError};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates and removes namespace anchors.
#[derive(Clone)]
pub struct NamespaceProvisioner {
    platform: Platform,
    runner: Arc<dyn ProcessRunner>,
}

impl NamespaceProvisioner {
    /// Create a provisioner driving the given engine.
    pub fn new(platform: Platform, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { platform, runner }
    }

    /// Start the anchor for `project`, publishing `ssh_port`.
    ///
    /// Not idempotent: an existing anchor with the same name makes the engine
    /// refuse, so callers clear stale containers first.
    ///
    /// # Errors
    ///
    /// Returns the engine failure if the container cannot be created.
    pub async fn create(
        &self,
        project: &ProjectIdentity,
        ssh_port: u16,
    ) -> Result<String, RunnerError> {
        let name = project.anchor_container();
        debug!("Creating network namespace container: {}", name);

        let spec = RunSpec::new(name.clone(), env::ANCHOR_IMAGE)
            .hostname(project.name())
            .publish(format!("{}:{}", ssh_port, ssh_port))
            .label(project.label())
            .label(Role::NetNs.label());
        let cmd = self.platform.engine(spec.to_args());

        let id = self.runner.run(&cmd).await?;
        info!("Created network namespace container: {} ({})", name, id);
        Ok(id)
    }

    /// Force-remove the anchor for `project`. A missing anchor counts as removed.
    ///
    /// # Errors
    ///
    /// Returns any other engine failure.
    pub async fn remove(&self, project: &ProjectIdentity) -> Result<(), RunnerError> {
        let name = project.anchor_container();
        debug!("Removing network namespace container: {}", name);
        let cmd = self.platform.engine(["rm".to_string(), "-f".to_string(), name.clone()]);
        match self.runner.run(&cmd).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_no_such_container() => {
                debug!("Network namespace container {} already absent", name);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Engine `--network` value that joins the anchor's namespace.
    pub fn attach_mode(project: &ProjectIdentity) -> String {
        format!("container:{}", project.anchor_container())
    }
}
