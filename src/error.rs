//! Orchestration errors and failure policy.
//!
//! Every lifecycle step is tagged with a [`Severity`] at the call site and its
//! outcome is passed through [`Severity::settle`], which is the only place that
//! decides whether a failure propagates, is swallowed, or is logged as a warning.

use crate::config::ConfigError;
use crate::platform::PlatformError;
use crate::runner::RunnerError;
use crate::state::StoreError;
use tracing::{debug, warn};

/// How a failed step affects the surrounding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the operation and surface the error
    Fatal,
    /// Cleanup that the next attempt retries naturally; ignore failures
    BestEffort,
    /// User convenience; log and continue
    Warning,
}

impl Severity {
    /// Apply this severity to a step result.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` for a tolerated
    /// failure, and `Err` only for a fatal failure.
    pub fn settle<T>(
        self,
        step: impl Into<String>,
        result: std::result::Result<T, RunnerError>,
    ) -> std::result::Result<Option<T>, EnvError> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (Severity::Fatal, Err(source)) => Err(EnvError::Step {
                step: step.into(),
                source,
            }),
            (Severity::BestEffort, Err(err)) => {
                debug!("ignoring failure while {}: {}", step.into(), err);
                Ok(None)
            }
            (Severity::Warning, Err(err)) => {
                warn!("{} failed: {}", step.into(), err);
                Ok(None)
            }
        }
    }
}

/// Settle a step that must succeed.
pub fn fatal<T>(
    step: impl Into<String>,
    result: std::result::Result<T, RunnerError>,
) -> std::result::Result<T, EnvError> {
    result.map_err(|source| EnvError::Step {
        step: step.into(),
        source,
    })
}

/// Errors surfaced by environment lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// An engine invocation failed during a named step
    #[error("{step}")]
    Step {
        step: String,
        #[source]
        source: RunnerError,
    },

    /// No descriptor exists for the project
    #[error("no environment found (run 'envclone up' first)")]
    NoEnvironment(#[source] StoreError),

    /// The dev container exists in the descriptor but is not running
    #[error("dev container {0} is not running (run 'envclone up' first)")]
    NotRunning(String),

    /// `exec` was called without a command
    #[error("exec requires a command to run")]
    EmptyCommand,

    /// Host platform problem
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Descriptor store problem
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Devcontainer configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EnvError {
    /// Whether this is a precondition failure the user fixes by running `up`.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NoEnvironment(_) | Self::NotRunning(_))
    }
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, EnvError>;
