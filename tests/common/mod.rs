//! In-memory container engine for integration tests.
//!
//! [`FakeEngine`] implements [`ProcessRunner`] and interprets the subset of
//! `nerdctl` the orchestrator uses (`ps`, `run`, `rm`, `inspect`, `build`,
//! `exec`), including commands wrapped in `limactl shell <vm> --`. Containers
//! live in memory so lifecycle properties can be checked without an engine.

#![allow(dead_code)]

use async_trait::async_trait;
use envclone::runner::{CommandLine, ProcessRunner, RunnerError};
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub labels: Vec<String>,
    pub image: String,
    pub network: Option<String>,
    pub running: bool,
}

#[derive(Default)]
struct EngineState {
    containers: Vec<FakeContainer>,
    next_id: u64,
    builds: Vec<Vec<String>>,
    execs: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<EngineState>,
    failing_images: Mutex<Vec<String>>,
    calls: Mutex<Vec<CommandLine>>,
    interactive: Mutex<Vec<CommandLine>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `run` of `image` fail as a pull error would.
    pub fn fail_image(&self, image: &str) {
        self.failing_images.lock().unwrap().push(image.to_string());
    }

    /// Mark a container as exited.
    pub fn stop(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(c) = state.containers.iter_mut().find(|c| c.name == name) {
            c.running = false;
        }
    }

    pub fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().unwrap().containers.clone()
    }

    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers().into_iter().map(|c| c.name).collect();
        names.sort();
        names
    }

    pub fn builds(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().builds.clone()
    }

    pub fn execs(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().execs.clone()
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    pub fn interactive_calls(&self) -> Vec<CommandLine> {
        self.interactive.lock().unwrap().clone()
    }

    fn handle(&self, command: &CommandLine) -> Result<String, RunnerError> {
        let fail = |code: i32, stderr: &str| RunnerError::Failed {
            command: command.to_string(),
            code: Some(code),
            stderr: stderr.to_string(),
        };

        let args: &[String] = match command.program.as_str() {
            "nerdctl" => &command.args,
            "limactl" if command.args.first().map(String::as_str) == Some("shell") => {
                let Some(sep) = command.args.iter().position(|a| a == "--") else {
                    return Err(fail(1, "missing --"));
                };
                if command.args.get(sep + 1).map(String::as_str) != Some("nerdctl") {
                    return Err(fail(127, "command not found"));
                }
                &command.args[sep + 2..]
            }
            "limactl" => return Ok("envclone:Running".to_string()),
            "systemctl" => return Ok("active".to_string()),
            other => return Err(fail(127, &format!("{}: command not found", other))),
        };

        let mut state = self.state.lock().unwrap();
        match args.first().map(String::as_str) {
            Some("ps") => Ok(ps(&state, &args[1..])),
            Some("run") => {
                let spec = parse_run(&args[1..]);
                if self.failing_images.lock().unwrap().contains(&spec.image) {
                    return Err(fail(1, &format!("failed to pull {}", spec.image)));
                }
                if state.containers.iter().any(|c| c.name == spec.name) {
                    return Err(fail(1, &format!("name {:?} is already used", spec.name)));
                }
                if let Some(anchor) = spec.network.as_deref().and_then(|n| n.strip_prefix("container:")) {
                    if !state.containers.iter().any(|c| c.name == anchor) {
                        return Err(fail(1, &format!("no such container: {}", anchor)));
                    }
                }
                state.next_id += 1;
                let id = format!("{:012x}", 0xc0ffee_0000 + state.next_id);
                state.containers.push(FakeContainer {
                    id: id.clone(),
                    name: spec.name,
                    labels: spec.labels,
                    image: spec.image,
                    network: spec.network,
                    running: true,
                });
                Ok(id)
            }
            Some("rm") => {
                let targets: Vec<&String> = args[1..].iter().filter(|a| !a.starts_with('-')).collect();
                let mut missing = Vec::new();
                for target in targets {
                    let before = state.containers.len();
                    state
                        .containers
                        .retain(|c| &c.id != target && &c.name != target);
                    if state.containers.len() == before {
                        missing.push(target.clone());
                    }
                }
                if missing.is_empty() {
                    Ok(String::new())
                } else {
                    Err(fail(1, &format!("no such container: {}", missing.join(", "))))
                }
            }
            Some("inspect") => {
                let name = args.last().cloned().unwrap_or_default();
                match state.containers.iter().find(|c| c.name == name || c.id == name) {
                    Some(c) => Ok(c.running.to_string()),
                    None => Err(fail(1, &format!("no such object: {}", name))),
                }
            }
            Some("build") => {
                state.builds.push(args.to_vec());
                Ok(String::new())
            }
            Some("exec") => {
                let name = args[1..].iter().find(|a| !a.starts_with('-')).cloned().unwrap_or_default();
                let running = state.containers.iter().find(|c| c.name == name).map(|c| c.running);
                match running {
                    Some(true) => {
                        state.execs.push(args.to_vec());
                        Ok(String::new())
                    }
                    Some(false) => Err(fail(1, "container is not running")),
                    None => Err(fail(1, &format!("no such container: {}", name))),
                }
            }
            _ => Err(fail(1, "unknown command")),
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeEngine {
    async fn run(&self, command: &CommandLine) -> Result<String, RunnerError> {
        self.calls.lock().unwrap().push(command.clone());
        self.handle(command)
    }

    async fn run_interactive(&self, command: &CommandLine) -> Result<(), RunnerError> {
        self.interactive.lock().unwrap().push(command.clone());
        self.handle(command).map(|_| ())
    }
}

struct RunArgs {
    name: String,
    labels: Vec<String>,
    network: Option<String>,
    image: String,
}

fn parse_run(args: &[String]) -> RunArgs {
    const WITH_VALUE: [&str; 8] = ["--name", "--label", "--network", "-p", "-e", "-v", "-w", "--hostname"];

    let mut run = RunArgs {
        name: String::new(),
        labels: Vec::new(),
        network: None,
        image: String::new(),
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if WITH_VALUE.contains(&arg.as_str()) {
            let value = iter.next().cloned().unwrap_or_default();
            match arg.as_str() {
                "--name" => run.name = value,
                "--label" => run.labels.push(value),
                "--network" => run.network = Some(value),
                _ => {}
            }
        } else if arg.starts_with('-') {
            continue;
        } else {
            run.image = arg.clone();
            break;
        }
    }
    run
}

fn ps(state: &EngineState, args: &[String]) -> String {
    let mut filter = None;
    let mut format = String::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--filter" => filter = iter.next().and_then(|f| f.strip_prefix("label=")).map(str::to_string),
            "--format" => format = iter.next().cloned().unwrap_or_default(),
            _ => {}
        }
    }

    state
        .containers
        .iter()
        .filter(|c| filter.as_ref().is_none_or(|f| c.labels.contains(f)))
        .map(|c| {
            if format == "{{.ID}}" {
                c.id.clone()
            } else {
                let status = if c.running { "Up 5 seconds" } else { "Exited (0) 1 second ago" };
                format!("{}\t{}\t{}", c.name, c.labels.join(","), status)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Create `<root>/<name>/.devcontainer/devcontainer.json` and return the project dir.
pub fn write_project(root: &Path, name: &str, devcontainer_json: &str) -> std::path::PathBuf {
    let project = root.join(name);
    let dir = project.join(".devcontainer");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("devcontainer.json"), devcontainer_json).unwrap();
    project
}

pub const WITH_DB: &str = r#"{
    "image": "debian:12",
    "services": [{"name": "db", "image": "postgres:16", "env": ["POSTGRES_PASSWORD=pw"]}]
}"#;
