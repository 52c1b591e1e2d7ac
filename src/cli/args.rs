//! Command line argument parsing
//!
//! Subcommands:
//! - `init`: Write a starter `.devcontainer/devcontainer.json`
//! - `up`: Create (or recreate) the project's environment
//! - `down`: Remove every container of the environment
//! - `status`: List the environment's containers
//! - `shell`: Open a login shell in the dev container
//! - `exec`: Run a command in the dev container
//! - `ssh-config`: Print or install the SSH host entry
//! - `show-config`: Show settings discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "envclone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Per-project development environments on containerd and nerdctl")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'p', long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Log engine commands instead of running them
    #[arg(short = 'n', long = "dry-run", global = true)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Write a starter devcontainer.json
    Init,
    /// Create the environment, replacing any previous one
    Up,
    /// Remove the environment's containers and record
    Down,
    /// Show the environment's containers
    Status,
    /// Open a shell in the dev container
    Shell,
    /// Run a command in the dev container
    Exec {
        /// Command and arguments
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        cmd: Vec<String>,
    },
    /// Print the SSH host entry for the environment
    SshConfig {
        /// Install the entry into ~/.ssh/config
        #[arg(long)]
        write: bool,
    },
    /// Show settings discovery information
    ShowConfig,
}
