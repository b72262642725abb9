//! Container parameters for a session and their create-call payload.
//!
//! A [`SessionConfig`] is assembled once by the caller and never changes
//! after the session begins; [`build_create_body`] turns it into the
//! `Bollard` create payload.

use std::collections::HashMap;

use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{CreateContainerOptions, CreateContainerOptionsBuilder};

use crate::error::{ConfigError, RfswiftError};

/// Label key written on every container this tool creates.
pub const PROJECT_LABEL_KEY: &str = "project";

/// Label value paired with [`PROJECT_LABEL_KEY`].
pub const PROJECT_LABEL_VALUE: &str = "rfswift";

/// Shell started when none is configured.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// The project label as a `key=value` list filter.
#[must_use]
pub fn project_label_filter() -> String {
    format!("{PROJECT_LABEL_KEY}={PROJECT_LABEL_VALUE}")
}

/// Parameters governing one container session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    image: String,
    name: Option<String>,
    shell: String,
    working_dir: Option<String>,
    network_mode: Option<String>,
    privileged: bool,
    x11_binding: String,
    usb_binding: String,
    extra_bindings: String,
    env: Vec<String>,
    extra_hosts: Vec<String>,
    display: Option<String>,
}

impl SessionConfig {
    /// Start a configuration for `image` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when `image` is empty or
    /// whitespace-only.
    pub fn new(image: impl Into<String>) -> Result<Self, RfswiftError> {
        let image_value = image.into();
        let trimmed = image_value.trim();
        if trimmed.is_empty() {
            return Err(RfswiftError::from(ConfigError::MissingRequired {
                field: String::from("image"),
            }));
        }

        Ok(Self {
            image: String::from(trimmed),
            name: None,
            shell: String::from(DEFAULT_SHELL),
            working_dir: None,
            network_mode: None,
            privileged: false,
            x11_binding: String::new(),
            usb_binding: String::new(),
            extra_bindings: String::new(),
            env: Vec::new(),
            extra_hosts: Vec::new(),
            display: None,
        })
    }

    /// Name the container; blank names are ignored.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|value| !value.trim().is_empty());
        self
    }

    /// Set the shell command line; blank values keep the default.
    #[must_use]
    pub fn with_shell(mut self, shell: Option<String>) -> Self {
        if let Some(value) = shell.filter(|candidate| !candidate.trim().is_empty()) {
            self.shell = value;
        }
        self
    }

    /// Set the working directory inside the container.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: Option<String>) -> Self {
        self.working_dir = working_dir.filter(|value| !value.trim().is_empty());
        self
    }

    /// Set the engine network mode (`host`, `bridge`, ...).
    #[must_use]
    pub fn with_network_mode(mut self, network_mode: Option<String>) -> Self {
        self.network_mode = network_mode.filter(|value| !value.trim().is_empty());
        self
    }

    /// Run the container privileged.
    #[must_use]
    pub const fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Comma-separated X11 socket bindings.
    #[must_use]
    pub fn with_x11_binding(mut self, binding: impl Into<String>) -> Self {
        self.x11_binding = binding.into();
        self
    }

    /// Comma-separated USB device bindings.
    #[must_use]
    pub fn with_usb_binding(mut self, binding: impl Into<String>) -> Self {
        self.usb_binding = binding.into();
        self
    }

    /// Comma-separated additional bindings (audio, user directories, ...).
    #[must_use]
    pub fn with_extra_bindings(mut self, bindings: impl Into<String>) -> Self {
        self.extra_bindings = bindings.into();
        self
    }

    /// Environment entries in `KEY=value` form.
    #[must_use]
    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = env;
        self
    }

    /// Extra `/etc/hosts` entries in `host:ip` form.
    #[must_use]
    pub fn with_extra_hosts(mut self, extra_hosts: Vec<String>) -> Self {
        self.extra_hosts = extra_hosts;
        self
    }

    /// Value exported as `DISPLAY` inside the container.
    #[must_use]
    pub fn with_display(mut self, display: Option<String>) -> Self {
        self.display = display.filter(|value| !value.trim().is_empty());
        self
    }

    /// The image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The optional container name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The raw shell command line.
    #[must_use]
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// The shell command line split on whitespace.
    #[must_use]
    pub fn shell_command(&self) -> Vec<String> {
        self.shell.split_whitespace().map(String::from).collect()
    }

    /// Whether the container runs privileged.
    #[must_use]
    pub const fn privileged(&self) -> bool {
        self.privileged
    }

    /// The optional network mode.
    #[must_use]
    pub fn network_mode(&self) -> Option<&str> {
        self.network_mode.as_deref()
    }

    /// The optional working directory.
    #[must_use]
    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    /// Bind mounts: X11, then USB, then extra, each comma-split with empty
    /// segments dropped.
    #[must_use]
    pub fn binds(&self) -> Vec<String> {
        [&self.x11_binding, &self.usb_binding, &self.extra_bindings]
            .into_iter()
            .flat_map(|group| group.split(','))
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(String::from)
            .collect()
    }

    /// Environment entries, with `DISPLAY` appended when configured.
    #[must_use]
    pub fn environment(&self) -> Vec<String> {
        let mut entries = self.env.clone();
        if let Some(display) = &self.display {
            entries.push(format!("DISPLAY={display}"));
        }
        entries
    }

    /// The labels written on the created container.
    #[must_use]
    pub fn labels(&self) -> HashMap<String, String> {
        HashMap::from([(
            String::from(PROJECT_LABEL_KEY),
            String::from(PROJECT_LABEL_VALUE),
        )])
    }
}

/// Create options carrying the optional container name.
pub(crate) fn build_create_options(config: &SessionConfig) -> Option<CreateContainerOptions> {
    config
        .name()
        .map(|name| CreateContainerOptionsBuilder::new().name(name).build())
}

/// Translate `config` into a create payload; `tty` allocates a terminal.
#[must_use]
pub fn build_create_body(config: &SessionConfig, tty: bool) -> ContainerCreateBody {
    let env = config.environment();
    let binds = config.binds();

    ContainerCreateBody {
        image: Some(String::from(config.image())),
        cmd: Some(config.shell_command()),
        env: (!env.is_empty()).then_some(env),
        working_dir: config.working_dir().map(String::from),
        labels: Some(config.labels()),
        tty: Some(tty),
        open_stdin: Some(true),
        attach_stdin: Some(true),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        host_config: Some(HostConfig {
            binds: (!binds.is_empty()).then_some(binds),
            network_mode: config.network_mode().map(String::from),
            privileged: Some(config.privileged()),
            extra_hosts: (!config.extra_hosts.is_empty()).then(|| config.extra_hosts.clone()),
            ..HostConfig::default()
        }),
        ..ContainerCreateBody::default()
    }
}
