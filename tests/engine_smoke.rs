//! Smoke tests against a real nerdctl.
//!
//! Skipped unless nerdctl answers `nerdctl info` and SKIP_ENGINE_TESTS is unset.
//! Only read-only engine calls are made.

use envclone::platform::{HostFacts, Platform};
use envclone::runner::HostRunner;
use envclone::settings::Settings;
use envclone::state::EnvironmentDescriptor;
use envclone::ContainerManager;
use std::path::PathBuf;
use std::sync::Arc;
use test_tag::tag;

fn should_run_engine_tests() -> bool {
    if let Ok(value) = std::env::var("SKIP_ENGINE_TESTS") {
        if value == "1" || value.eq_ignore_ascii_case("true") {
            return false;
        }
    }

    std::process::Command::new("nerdctl")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[tokio::test]
#[tag(integration, engine)]
async fn test_unknown_project_has_no_containers() {
    if !should_run_engine_tests() {
        eprintln!("Skipping engine tests (nerdctl not available or SKIP_ENGINE_TESTS=1)");
        return;
    }

    let platform = Platform::detect(&HostFacts::gather(), &Settings::default()).unwrap();
    let project_dir = PathBuf::from("/nonexistent/envclone-smoke-test");
    let manager = ContainerManager::new(platform, Arc::new(HostRunner::new()), &project_dir);
    let descriptor = EnvironmentDescriptor {
        project_name: manager.project().name().to_string(),
        project_key: manager.project().key().to_string(),
        project_dir,
        dev_container_id: String::new(),
        net_anchor_id: String::new(),
        service_ids: Vec::new(),
        ssh_port: 2222,
        remote_user: "root".to_string(),
    };

    assert!(!manager.is_running(&descriptor).await);
    assert!(manager.status(&descriptor).await.unwrap().is_empty());
    // Nothing to remove is not an error.
    manager.down(&descriptor).await.unwrap();
}
