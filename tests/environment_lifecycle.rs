//! Integration tests for the environment lifecycle against an in-memory engine.

mod common;

use common::{FakeEngine, WITH_DB, write_project};
use envclone::config::DevContainerConfig;
use envclone::container::ContainerManager;
use envclone::platform::{DirectEngine, Platform, VmBridge};
use envclone::project::Role;
use envclone::state::DescriptorStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use test_tag::tag;

fn direct() -> Platform {
    Platform::Direct(DirectEngine::new(2222))
}

fn manager(engine: &Arc<FakeEngine>, project_dir: &Path) -> ContainerManager {
    ContainerManager::new(direct(), engine.clone(), project_dir)
}

#[tokio::test]
#[tag(integration)]
async fn test_up_creates_anchor_dev_and_services() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let manager = manager(&engine, &project);

    let config = DevContainerConfig::load(&project).unwrap();
    let descriptor = manager.up(&config).await.unwrap();
    let id = manager.project().clone();

    assert_eq!(descriptor.project_name, "api");
    assert_eq!(descriptor.project_key, id.key());
    assert_eq!(descriptor.service_ids.len(), 1);
    assert_eq!(descriptor.ssh_port, 2222);
    assert_eq!(
        engine.container_names(),
        vec![
            id.service_container("db"),
            id.dev_container(),
            id.anchor_container()
        ]
    );

    let mut status = manager.status(&descriptor).await.unwrap();
    status.sort_by(|a, b| a.name.cmp(&b.name));
    let roles: Vec<Role> = status.iter().map(|s| s.role).collect();
    assert_eq!(roles, vec![Role::Service, Role::Dev, Role::NetNs]);
    assert!(status.iter().all(|s| !s.status.is_empty()));

    // Everything but the anchor joins the anchor's namespace.
    let attach = format!("container:{}", id.anchor_container());
    for container in engine.containers() {
        if container.name == id.anchor_container() {
            assert_eq!(container.network, None);
        } else {
            assert_eq!(container.network.as_deref(), Some(attach.as_str()));
        }
    }
}

#[tokio::test]
#[tag(integration)]
async fn test_up_twice_replaces_previous_environment() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let manager = manager(&engine, &project);
    let config = DevContainerConfig::load(&project).unwrap();

    let first = manager.up(&config).await.unwrap();
    let second = manager.up(&config).await.unwrap();

    let containers = engine.containers();
    assert_eq!(containers.len(), 3);
    let ids: Vec<&str> = containers.iter().map(|c| c.id.as_str()).collect();
    assert!(!ids.contains(&first.dev_container_id.as_str()));
    assert!(!ids.contains(&first.net_anchor_id.as_str()));
    assert!(!ids.contains(&first.service_ids[0].as_str()));
    assert!(ids.contains(&second.dev_container_id.as_str()));
}

#[tokio::test]
#[tag(integration)]
async fn test_down_removes_only_own_project() {
    let root = TempDir::new().unwrap();
    let api = write_project(root.path(), "api", WITH_DB);
    let web = write_project(root.path(), "web", WITH_DB);
    let engine = Arc::new(FakeEngine::new());

    let api_manager = manager(&engine, &api);
    let web_manager = manager(&engine, &web);
    let api_env = api_manager.up(&DevContainerConfig::load(&api).unwrap()).await.unwrap();
    web_manager.up(&DevContainerConfig::load(&web).unwrap()).await.unwrap();
    assert_eq!(engine.containers().len(), 6);

    api_manager.down(&api_env).await.unwrap();

    let web_id = web_manager.project();
    assert_eq!(
        engine.container_names(),
        vec![
            web_id.service_container("db"),
            web_id.dev_container(),
            web_id.anchor_container()
        ]
    );
    // A second teardown finds nothing and still succeeds.
    api_manager.down(&api_env).await.unwrap();
}

#[tokio::test]
#[tag(integration)]
async fn test_same_named_projects_stay_isolated() {
    let root = TempDir::new().unwrap();
    let a = write_project(&root.path().join("team-a"), "api", WITH_DB);
    let b = write_project(&root.path().join("team-b"), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let store = DescriptorStore::new(root.path().join("state"));

    let a_manager = manager(&engine, &a);
    let b_manager = manager(&engine, &b);
    let a_env = a_manager.up(&DevContainerConfig::load(&a).unwrap()).await.unwrap();
    store.save(&a_env).await.unwrap();
    let b_env = b_manager.up(&DevContainerConfig::load(&b).unwrap()).await.unwrap();
    store.save(&b_env).await.unwrap();

    // Bringing up B must not clear A as stale.
    assert_eq!(engine.containers().len(), 6);
    let ids: Vec<String> = engine.containers().into_iter().map(|c| c.id).collect();
    assert!(ids.contains(&a_env.dev_container_id));
    assert!(ids.contains(&b_env.dev_container_id));
    assert!(a_manager.is_running(&a_env).await);
    assert_ne!(a_env.project_key, b_env.project_key);
    assert_eq!(store.load(&a).await.unwrap(), a_env);
    assert_eq!(store.load(&b).await.unwrap(), b_env);

    a_manager.down(&a_env).await.unwrap();

    let b_id = b_manager.project();
    assert_eq!(
        engine.container_names(),
        vec![
            b_id.service_container("db"),
            b_id.dev_container(),
            b_id.anchor_container()
        ]
    );
    assert!(b_manager.is_running(&b_env).await);
}

#[tokio::test]
#[tag(integration)]
async fn test_down_then_descriptor_is_gone() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let manager = manager(&engine, &project);
    let store = DescriptorStore::new(root.path().join("state"));

    let descriptor = manager.up(&DevContainerConfig::load(&project).unwrap()).await.unwrap();
    store.save(&descriptor).await.unwrap();

    let loaded = store.load(&project).await.unwrap();
    assert_eq!(loaded, descriptor);

    manager.down(&loaded).await.unwrap();
    store.remove(&project).await.unwrap();

    assert!(engine.containers().is_empty());
    assert!(store.load(&project).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[tag(integration)]
async fn test_build_resolves_dockerfile_and_tags_per_project() {
    let root = TempDir::new().unwrap();
    let json = r#"{"build": {"dockerfile": "Dockerfile.dev"}}"#;
    let api = write_project(root.path(), "api", json);
    let web = write_project(root.path(), "web", json);
    let engine = Arc::new(FakeEngine::new());

    let api_manager = manager(&engine, &api);
    let web_manager = manager(&engine, &web);
    api_manager
        .up(&DevContainerConfig::load(&api).unwrap())
        .await
        .unwrap();
    web_manager
        .up(&DevContainerConfig::load(&web).unwrap())
        .await
        .unwrap();
    let api_tag = api_manager.project().image_tag();

    let builds = engine.builds();
    assert_eq!(builds.len(), 2);
    let dockerfile = api.join(".devcontainer").join("Dockerfile.dev");
    assert_eq!(
        builds[0],
        vec![
            "build".to_string(),
            "-t".to_string(),
            api_tag.clone(),
            "-f".to_string(),
            dockerfile.to_string_lossy().into_owned(),
            api.join(".devcontainer").to_string_lossy().into_owned(),
        ]
    );
    assert_eq!(builds[1][2], web_manager.project().image_tag());
    assert_ne!(builds[0][2], builds[1][2]);

    let dev = engine
        .containers()
        .into_iter()
        .find(|c| c.name == api_manager.project().dev_container())
        .unwrap();
    assert_eq!(dev.image, api_tag);
}

#[tokio::test]
#[tag(integration)]
async fn test_service_failure_aborts_before_dev_container() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    engine.fail_image("postgres:16");

    let manager = manager(&engine, &project);
    let err = manager
        .up(&DevContainerConfig::load(&project).unwrap())
        .await
        .unwrap_err();

    assert!(format!("{:#}", anyhow::Error::from(err)).contains("service container db"));
    // The anchor is left behind for the next up or down to clear.
    assert_eq!(engine.container_names(), vec![manager.project().anchor_container()]);
}

#[tokio::test]
#[tag(integration)]
async fn test_is_running_reports_without_failing() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let manager = manager(&engine, &project);

    let descriptor = manager.up(&DevContainerConfig::load(&project).unwrap()).await.unwrap();
    assert!(manager.is_running(&descriptor).await);

    engine.stop(&manager.project().dev_container());
    assert!(!manager.is_running(&descriptor).await);

    manager.down(&descriptor).await.unwrap();
    assert!(!manager.is_running(&descriptor).await);
}

#[tokio::test]
#[tag(integration)]
async fn test_post_commands_run_in_dev_container() {
    let root = TempDir::new().unwrap();
    let project = write_project(
        root.path(),
        "api",
        r#"{"image": "debian:12", "postCreateCommand": "make deps", "postStartCommand": "make serve"}"#,
    );
    let engine = Arc::new(FakeEngine::new());

    let manager = manager(&engine, &project);
    manager
        .up(&DevContainerConfig::load(&project).unwrap())
        .await
        .unwrap();

    let dev = manager.project().dev_container();
    let execs = engine.execs();
    assert_eq!(execs.len(), 2);
    assert_eq!(execs[0], vec!["exec", dev.as_str(), "sh", "-c", "make deps"]);
    assert_eq!(execs[1][4], "make serve");
}

#[tokio::test]
#[tag(integration)]
async fn test_bridged_platform_routes_through_vm_shell() {
    let root = TempDir::new().unwrap();
    let project = write_project(root.path(), "api", WITH_DB);
    let engine = Arc::new(FakeEngine::new());
    let platform = Platform::Bridged(VmBridge::new("envclone", 2200));
    let manager = ContainerManager::new(platform.clone(), engine.clone(), &project);

    platform.ensure_runtime(engine.as_ref()).await.unwrap();
    let descriptor = manager.up(&DevContainerConfig::load(&project).unwrap()).await.unwrap();

    assert_eq!(descriptor.ssh_port, 2200);
    assert_eq!(engine.containers().len(), 3);
    for call in engine.calls() {
        assert_eq!(call.program, "limactl");
    }
    let engine_calls: Vec<_> = engine
        .calls()
        .into_iter()
        .filter(|c| c.args.first().map(String::as_str) == Some("shell"))
        .collect();
    assert!(!engine_calls.is_empty());
    assert!(
        engine_calls
            .iter()
            .all(|c| c.args[..4] == ["shell", "envclone", "--", "nerdctl"])
    );

    manager.down(&descriptor).await.unwrap();
    assert!(engine.containers().is_empty());
}
