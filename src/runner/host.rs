//! Native host command execution.
//!
//! Executes commands directly on the host system using `tokio::process::Command`.
//! Child processes are killed when the awaiting future is dropped, so a
//! cancelled invocation does not leave the in-flight engine call running.

use super::{CommandLine, ProcessRunner, RunnerError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Executes commands directly on the host system
#[derive(Debug, Clone, Default)]
pub struct HostRunner {
    dry_run: bool,
}

impl HostRunner {
    /// Create a new host runner
    pub fn new() -> Self {
        Self { dry_run: false }
    }

    /// Create a runner that only logs commands and reports empty output
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Whether commands are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn command(cmd: &CommandLine) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ProcessRunner for HostRunner {
    async fn run(&self, cmd: &CommandLine) -> Result<String, RunnerError> {
        debug!("exec: {}", cmd);

        if self.dry_run {
            info!("dry run, skipping: {}", cmd);
            return Ok(String::new());
        }

        let output = Self::command(cmd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RunnerError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(RunnerError::Failed {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run_interactive(&self, cmd: &CommandLine) -> Result<(), RunnerError> {
        debug!("exec (interactive): {}", cmd);

        if self.dry_run {
            info!("dry run, skipping: {}", cmd);
            return Ok(());
        }

        let status = Self::command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| RunnerError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(RunnerError::Failed {
                command: cmd.to_string(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}
