//! Platform capability layer.
//!
//! All host-OS differences live here. The orchestrator receives a [`Platform`]
//! chosen once at startup and never inspects host identity itself.
//!
//! - [`DirectEngine`]: `nerdctl` runs on the host (Linux, rootless containerd).
//! - [`VmBridge`]: `nerdctl` runs inside a Lima VM reached through
//!   `limactl shell <vm> --` (macOS). The VM is created or started on demand.

use crate::env;
use crate::runner::{CommandLine, ProcessRunner, RunnerError};
use crate::settings::Settings;
use tracing::debug;

mod bridged;
mod direct;

pub use bridged::VmBridge;
pub use direct::DirectEngine;

/// Host platform errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The host OS has no engine variant
    #[error("unsupported platform: {0}")]
    Unsupported(String),

    /// A required tool is not on PATH
    #[error("{tool} not found in PATH\n{hint}")]
    MissingTool { tool: String, hint: String },

    /// The engine is installed but not usable
    #[error("{reason}\n{hint}")]
    RuntimeNotReady { reason: String, hint: String },

    /// A VM control command failed
    #[error("failed to {action} Lima VM {vm}")]
    Vm {
        action: &'static str,
        vm: String,
        #[source]
        source: RunnerError,
    },
}

/// Host facts gathered once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    /// `std::env::consts::OS` value
    pub os: String,
    /// Whether `nerdctl` is on PATH
    pub has_nerdctl: bool,
    /// Whether `limactl` is on PATH
    pub has_limactl: bool,
}

impl HostFacts {
    /// Probe the current host.
    pub fn gather() -> Self {
        let facts = Self {
            os: std::env::consts::OS.to_string(),
            has_nerdctl: which::which(env::ENGINE_BINARY).is_ok(),
            has_limactl: which::which(env::LIMA_BINARY).is_ok(),
        };
        debug!("host facts: {:?}", facts);
        facts
    }
}

/// Engine variant for this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Engine invoked directly
    Direct(DirectEngine),
    /// Engine invoked through a VM shell bridge
    Bridged(VmBridge),
}

impl Platform {
    /// Select the variant matching the host facts.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS is unsupported or its engine tool is missing.
    pub fn detect(facts: &HostFacts, settings: &Settings) -> Result<Self, PlatformError> {
        match facts.os.as_str() {
            "linux" => {
                if !facts.has_nerdctl {
                    return Err(PlatformError::MissingTool {
                        tool: env::ENGINE_BINARY.to_string(),
                        hint: "Install: https://github.com/containerd/nerdctl#install".to_string(),
                    });
                }
                Ok(Self::Direct(DirectEngine::new(settings.ssh_port)))
            }
            "macos" => {
                if !facts.has_limactl {
                    return Err(PlatformError::MissingTool {
                        tool: "lima".to_string(),
                        hint: "Install: brew install lima".to_string(),
                    });
                }
                Ok(Self::Bridged(VmBridge::new(
                    settings.vm_name.clone(),
                    settings.ssh_port,
                )))
            }
            other => Err(PlatformError::Unsupported(other.to_string())),
        }
    }

    /// Short host name (`linux`, `darwin`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct(_) => "linux",
            Self::Bridged(_) => "darwin",
        }
    }

    /// Turn a logical engine subcommand into an invocable command.
    pub fn engine<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self {
            Self::Direct(engine) => engine.engine(args),
            Self::Bridged(bridge) => bridge.engine(args),
        }
    }

    /// Bind-mount arguments for a host/container path pair.
    pub fn mount_args(&self, host_path: &str, container_path: &str) -> Vec<String> {
        // Lima mounts the host home writable at the same path, so both
        // variants use the plain bind form.
        vec!["-v".to_string(), format!("{}:{}", host_path, container_path)]
    }

    /// Host port on which the environment's SSH daemon is published.
    pub fn ssh_port(&self) -> u16 {
        match self {
            Self::Direct(engine) => engine.ssh_port(),
            Self::Bridged(bridge) => bridge.ssh_port(),
        }
    }

    /// Verify the engine is reachable, repairing what can be repaired.
    ///
    /// # Errors
    ///
    /// Returns an error with a remediation hint when the runtime cannot be made ready.
    pub async fn ensure_runtime(&self, runner: &dyn ProcessRunner) -> Result<(), PlatformError> {
        match self {
            Self::Direct(engine) => engine.ensure_runtime(runner).await,
            Self::Bridged(bridge) => bridge.ensure_runtime(runner).await,
        }
    }

    /// Release platform-held resources. Neither variant holds any today.
    pub async fn cleanup(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}
