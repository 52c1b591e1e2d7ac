//! # Process Runner
//!
//! The single boundary where host-affecting side effects happen. Every engine
//! action, VM control call and readiness probe reduces to one [`CommandLine`]
//! handed to a [`ProcessRunner`].
//!
//! - [`ProcessRunner::run`] captures standard output and returns it trimmed.
//!   A non-zero exit becomes [`RunnerError::Failed`] carrying the full command
//!   line and the captured standard error.
//! - [`ProcessRunner::run_interactive`] attaches the caller's terminal.
//!
//! [`HostRunner`] spawns real processes through `tokio::process::Command`.
//! Test code supplies its own implementation to simulate an engine.
//!
//! ```rust,no_run
//! use envclone::runner::{CommandLine, HostRunner, ProcessRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = HostRunner::new();
//!     let out = runner.run(&CommandLine::new("nerdctl", ["ps", "-a"])).await?;
//!     println!("{}", out);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;

/// Host process execution.
///
/// Implements [`HostRunner`] on top of `tokio::process::Command`.
pub mod host;

pub use host::HostRunner;

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program name or path
    pub program: String,
    /// Arguments passed verbatim
    pub args: Vec<String>,
}

impl CommandLine {
    /// Create a command from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Append more arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_escape::escape(Cow::Borrowed(self.program.as_str())))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape::escape(Cow::Borrowed(arg.as_str())))?;
        }
        Ok(())
    }
}

/// Errors raised at the process boundary.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The process could not be started at all
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("`{command}` exited with {}{}", exit_label(.code), stderr_suffix(.stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl RunnerError {
    /// Exit code of a failed process, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => *code,
            Self::Spawn { .. } => None,
        }
    }

    /// Captured standard error of a failed process.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Failed { stderr, .. } => stderr,
            Self::Spawn { .. } => "",
        }
    }

    /// Whether the engine reported that the target container does not exist.
    pub fn is_no_such_container(&self) -> bool {
        self.stderr().to_ascii_lowercase().contains("no such container")
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}

/// Executes external command vectors.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, returning trimmed standard output.
    async fn run(&self, command: &CommandLine) -> Result<String, RunnerError>;

    /// Run with the caller's stdin/stdout/stderr attached.
    async fn run_interactive(&self, command: &CommandLine) -> Result<(), RunnerError>;
}
