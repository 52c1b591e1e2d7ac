//! Engine `run` argument builder.
//!
//! Provides a fluent API for assembling the detached `run` invocations used for
//! anchors, services and dev containers, keeping flag order stable.

/// Arguments of one detached container run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    name: String,
    image: String,
    hostname: Option<String>,
    publish: Vec<String>,
    labels: Vec<String>,
    network: Option<String>,
    env: Vec<String>,
    volume_args: Vec<String>,
    working_dir: Option<String>,
    init: bool,
    extra_args: Vec<String>,
    cmd: Vec<String>,
}

impl RunSpec {
    /// Start a spec for container `name` running `image`.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            hostname: None,
            publish: Vec::new(),
            labels: Vec::new(),
            network: None,
            env: Vec::new(),
            volume_args: Vec::new(),
            working_dir: None,
            init: false,
            extra_args: Vec::new(),
            cmd: Vec::new(),
        }
    }

    /// Set the container hostname.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Publish `host:container` port mapping.
    pub fn publish(mut self, mapping: impl Into<String>) -> Self {
        self.publish.push(mapping.into());
        self
    }

    /// Add a `key=value` label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Set the `--network` mode.
    pub fn network(mut self, mode: impl Into<String>) -> Self {
        self.network = Some(mode.into());
        self
    }

    /// Add `KEY=VALUE` environment assignments.
    pub fn envs<I, S>(mut self, envs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(envs.into_iter().map(Into::into));
        self
    }

    /// Add a `-v` volume spec.
    pub fn volume(mut self, spec: impl Into<String>) -> Self {
        self.volume_args.push("-v".to_string());
        self.volume_args.push(spec.into());
        self
    }

    /// Add pre-rendered mount arguments.
    pub fn mount_args(mut self, args: Vec<String>) -> Self {
        self.volume_args.extend(args);
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Run an init process as PID 1.
    pub fn init(mut self) -> Self {
        self.init = true;
        self
    }

    /// Append user-supplied engine arguments before the image.
    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the command run after the image.
    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = cmd.into_iter().map(Into::into).collect();
        self
    }

    /// Container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the engine arguments, starting with `run -d`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.name.clone(),
        ];

        if let Some(hostname) = &self.hostname {
            args.push("--hostname".to_string());
            args.push(hostname.clone());
        }
        for mapping in &self.publish {
            args.push("-p".to_string());
            args.push(mapping.clone());
        }
        for label in &self.labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        if let Some(network) = &self.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }
        for assignment in &self.env {
            args.push("-e".to_string());
            args.push(assignment.clone());
        }
        args.extend(self.volume_args.iter().cloned());
        if let Some(dir) = &self.working_dir {
            args.push("-w".to_string());
            args.push(dir.clone());
        }
        if self.init {
            args.push("--init".to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(self.image.clone());
        args.extend(self.cmd.iter().cloned());
        args
    }
}
