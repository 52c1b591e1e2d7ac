//! Project image build planning.

use crate::config::BuildConfig;
use crate::env;
use crate::project::ProjectIdentity;
use std::path::{Path, PathBuf};

/// Resolved `build` invocation for a project's Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub tag: String,
}

impl BuildPlan {
    /// Resolve paths against `<project>/.devcontainer`.
    ///
    /// Relative paths are joined onto the devcontainer directory, absolute paths
    /// are kept. Without a declared context the Dockerfile's directory is used.
    pub fn resolve(project_dir: &Path, build: &BuildConfig, project: &ProjectIdentity) -> Self {
        let base = env::devcontainer_dir_path(project_dir);
        let dockerfile = base.join(&build.dockerfile);
        let context = match build.context.as_deref().filter(|c| !c.is_empty()) {
            Some(context) => base.join(context),
            None => dockerfile
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| base.clone()),
        };

        Self {
            dockerfile,
            context,
            tag: project.image_tag(),
        }
    }

    /// Engine arguments: `build -t <tag> -f <dockerfile> <context>`.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "build".to_string(),
            "-t".to_string(),
            self.tag.clone(),
            "-f".to_string(),
            self.dockerfile.to_string_lossy().into_owned(),
            self.context.to_string_lossy().into_owned(),
        ]
    }
}
