//! CLI-specific functionality
//!
//! This module contains argument parsing and the subcommand handlers.

pub mod args;
pub mod commands;

pub use args::{Args, Commands};
pub use commands::{App, NO_ENVIRONMENT, render_status};
