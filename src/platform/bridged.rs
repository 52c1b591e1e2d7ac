//! Engine hosted inside a Lima VM.

use super::PlatformError;
use crate::env;
use crate::runner::{CommandLine, ProcessRunner};
use tracing::{debug, info};

/// `nerdctl` inside a named Lima VM, reached through `limactl shell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmBridge {
    vm_name: String,
    ssh_port: u16,
}

/// Observed state of the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VmState {
    Absent,
    Running,
    Stopped(String),
}

impl VmBridge {
    /// Create a bridge to the VM named `vm_name`.
    pub fn new(vm_name: impl Into<String>, ssh_port: u16) -> Self {
        Self {
            vm_name: vm_name.into(),
            ssh_port,
        }
    }

    /// Name of the hosting VM.
    pub fn vm_name(&self) -> &str {
        &self.vm_name
    }

    pub(super) fn engine<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::new(
            env::LIMA_BINARY,
            ["shell", self.vm_name.as_str(), "--", env::ENGINE_BINARY],
        )
        .with_args(args)
    }

    pub(super) fn ssh_port(&self) -> u16 {
        self.ssh_port
    }

    /// Create the VM if absent, start it if stopped, no-op if running.
    pub(super) async fn ensure_runtime(
        &self,
        runner: &dyn ProcessRunner,
    ) -> Result<(), PlatformError> {
        match self.vm_state(runner).await? {
            VmState::Running => {
                debug!("Lima VM {} already running", self.vm_name);
                Ok(())
            }
            VmState::Stopped(status) => {
                info!("Starting Lima VM {} (status: {})", self.vm_name, status);
                self.start(runner).await
            }
            VmState::Absent => {
                info!("Creating Lima VM {}", self.vm_name);
                self.create(runner).await?;
                self.start(runner).await
            }
        }
    }

    pub(crate) async fn vm_state(
        &self,
        runner: &dyn ProcessRunner,
    ) -> Result<VmState, PlatformError> {
        let list = CommandLine::new(
            env::LIMA_BINARY,
            ["list", "--format", "{{.Name}}:{{.Status}}"],
        );
        let out = runner.run(&list).await.map_err(|source| PlatformError::Vm {
            action: "list",
            vm: self.vm_name.clone(),
            source,
        })?;

        Ok(parse_vm_state(&out, &self.vm_name))
    }

    async fn start(&self, runner: &dyn ProcessRunner) -> Result<(), PlatformError> {
        let start = CommandLine::new(env::LIMA_BINARY, ["start", self.vm_name.as_str()]);
        runner
            .run(&start)
            .await
            .map(|_| ())
            .map_err(|source| PlatformError::Vm {
                action: "start",
                vm: self.vm_name.clone(),
                source,
            })
    }

    async fn create(&self, runner: &dyn ProcessRunner) -> Result<(), PlatformError> {
        let create = CommandLine::new(
            env::LIMA_BINARY,
            [
                "create".to_string(),
                format!("--name={}", self.vm_name),
                "--vm-type=vz".to_string(),
                "--mount-type=virtiofs".to_string(),
                "--mount-writable".to_string(),
                "--containerd=user".to_string(),
                "template://default".to_string(),
            ],
        );
        runner
            .run(&create)
            .await
            .map(|_| ())
            .map_err(|source| PlatformError::Vm {
                action: "create",
                vm: self.vm_name.clone(),
                source,
            })
    }
}

/// Find the VM by exact name in `name:status` lines.
fn parse_vm_state(listing: &str, vm_name: &str) -> VmState {
    listing
        .lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(name, _)| *name == vm_name)
        .map(|(_, status)| match status.trim() {
            "Running" => VmState::Running,
            other => VmState::Stopped(other.to_string()),
        })
        .unwrap_or(VmState::Absent)
}
