//! Engine invoked directly on the host.

use super::PlatformError;
use crate::env;
use crate::runner::{CommandLine, ProcessRunner};
use tracing::debug;

/// `nerdctl` on the host against rootless containerd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectEngine {
    ssh_port: u16,
}

impl DirectEngine {
    /// Create the direct engine publishing SSH on `ssh_port`.
    pub fn new(ssh_port: u16) -> Self {
        Self { ssh_port }
    }

    pub(super) fn engine<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::new(env::ENGINE_BINARY, args)
    }

    pub(super) fn ssh_port(&self) -> u16 {
        self.ssh_port
    }

    /// Rootless containerd must be active under the user's systemd.
    pub(super) async fn ensure_runtime(
        &self,
        runner: &dyn ProcessRunner,
    ) -> Result<(), PlatformError> {
        let probe = CommandLine::new("systemctl", ["--user", "is-active", "containerd"]);
        let state = runner.run(&probe).await;
        debug!("containerd state: {:?}", state);

        match state {
            Ok(out) if out == "active" => Ok(()),
            _ => Err(PlatformError::RuntimeNotReady {
                reason: "rootless containerd is not running".to_string(),
                hint: "Start it with: systemctl --user start containerd\n\
                       Or set it up with: containerd-rootless-setuptool.sh install"
                    .to_string(),
            }),
        }
    }
}
