//! Environment constants and path utilities.
//!
//! This module centralizes the names, labels, default values and directory
//! layout shared by the engine bridge, the orchestrator and the descriptor store.

use std::path::{Path, PathBuf};

/// Application name, used as container/image prefix and state directory name
pub const APP_NAME: &str = "envclone";

/// Label key carrying the per-project identity
pub const PROJECT_LABEL_KEY: &str = "envclone.project";

/// Label key carrying the container role (`dev`, `service`, `netns`)
pub const ROLE_LABEL_KEY: &str = "envclone.role";

/// Image used for the network namespace anchor
pub const ANCHOR_IMAGE: &str = "registry.k8s.io/pause:3.10";

/// Container engine binary
pub const ENGINE_BINARY: &str = "nerdctl";

/// Lima control binary used by the VM-bridged engine
pub const LIMA_BINARY: &str = "limactl";

/// SSH port published by the anchor unless overridden
pub const DEFAULT_SSH_PORT: u16 = 2222;

/// Name of the Lima VM hosting the engine on macOS
pub const DEFAULT_VM_NAME: &str = "envclone";

/// Default workspace mount point inside the dev container
pub const DEFAULT_WORKSPACE_MOUNT: &str = "/workspace";

/// Remote user when the devcontainer config does not declare one
pub const DEFAULT_REMOTE_USER: &str = "root";

/// Login shell used by `shell`
pub const LOGIN_SHELL: &str = "/bin/bash";

/// Entrypoint keeping the dev container alive between exec calls
pub const IDLE_ENTRYPOINT: [&str; 2] = ["sleep", "infinity"];

/// Number of hex characters kept from the project path hash
pub const FINGERPRINT_LEN: usize = 12;

/// Number of hash characters appended to the project name in its key
pub const PROJECT_KEY_HASH_LEN: usize = 8;

/// Devcontainer-related names
pub mod devcontainer {
    /// Configuration directory inside a project
    pub const DIR_NAME: &str = ".devcontainer";

    /// Configuration file inside [`DIR_NAME`]
    pub const FILE_NAME: &str = "devcontainer.json";
}

/// Settings file names
pub mod settings {
    /// Project-local settings file
    pub const LOCAL_FILE_NAME: &str = "envclone.toml";

    /// Settings file inside the user config directory
    pub const USER_FILE_NAME: &str = "config.toml";
}

/// Build the `.devcontainer` directory path for a project
pub fn devcontainer_dir_path(project_dir: &Path) -> PathBuf {
    project_dir.join(devcontainer::DIR_NAME)
}

/// Build the `devcontainer.json` path for a project
pub fn devcontainer_file_path(project_dir: &Path) -> PathBuf {
    devcontainer_dir_path(project_dir).join(devcontainer::FILE_NAME)
}

/// Build the descriptor state directory from a home directory
pub fn state_dir_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".local").join("share").join(APP_NAME)
}

/// Build the user settings file path from the platform config directory
pub fn user_settings_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(APP_NAME).join(settings::USER_FILE_NAME)
}

/// Build the project-local settings file path
pub fn local_settings_file_path(current_dir: &Path) -> PathBuf {
    current_dir.join(settings::LOCAL_FILE_NAME)
}

/// Build the SSH client config path from a home directory
pub fn ssh_config_file_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".ssh").join("config")
}
