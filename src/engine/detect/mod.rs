//! Platform- and mode-specific discovery of engine endpoints.
//!
//! Each backend is resolved through the same chain:
//!
//! 1. An engine-specific environment variable naming the endpoint
//!    (`PODMAN_HOST`, `CONTAINER_HOST` for Podman).
//! 2. The generic `DOCKER_HOST`, but only when it textually points at the
//!    target engine.
//! 3. OS convention paths, most specific first, validated as socket special
//!    files. Named pipes and Docker Desktop are validated with a ping instead.
//!
//! When a Podman socket is expected but absent, the detector activates the
//! service once (socket unit or machine VM), waits a fixed delay, and checks
//! again exactly once.

mod machine;
mod probe;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use self::machine::{parse_machine_inspect, pipe_name};
use super::connection::{EngineEndpoint, Transport};

pub use self::probe::{HostProbe, Platform, SystemHostProbe};

/// Generic engine host variable (Docker convention).
pub const DOCKER_HOST_VAR: &str = "DOCKER_HOST";

/// Podman-specific host variables, highest priority first.
const PODMAN_HOST_VARS: &[&str] = &["PODMAN_HOST", "CONTAINER_HOST"];

/// Delay between a one-shot service activation and the re-check.
pub const ACTIVATION_DELAY: Duration = Duration::from_secs(2);

const DOCKER_PIPE: &str = "docker_engine";
const PODMAN_MACHINE_PIPE: &str = "podman-machine-default";
const ROOTFUL_PODMAN_SOCKETS: &[&str] = &["/run/podman/podman.sock", "/var/run/podman/podman.sock"];
const SYSTEM_DOCKER_SOCKETS: &[&str] = &["/var/run/docker.sock", "/run/docker.sock"];

/// A detected Podman endpoint together with its privilege mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodmanEndpoint {
    /// Where the Podman API listens.
    pub endpoint: EngineEndpoint,
    /// Whether the service runs unprivileged; drives user-level vs
    /// system-level service control.
    pub rootless: bool,
}

/// Resolves engine endpoints from the environment and host conventions.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
pub struct SocketDetector<E: mockable::Env> {
    env: E,
    probe: Arc<dyn HostProbe>,
    platform: Platform,
}

impl<E: mockable::Env> SocketDetector<E> {
    /// Creates a detector for `platform` using the given environment and probe.
    #[must_use]
    pub fn new(env: E, probe: Arc<dyn HostProbe>, platform: Platform) -> Self {
        Self {
            env,
            probe,
            platform,
        }
    }

    /// The platform this detector resolves conventions for.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// The host probe, shared with service control.
    #[must_use]
    pub fn probe(&self) -> &dyn HostProbe {
        self.probe.as_ref()
    }

    /// Read a non-empty environment variable.
    pub(crate) fn var(&self, name: &str) -> Option<String> {
        self.env.string(name).filter(|value| !value.trim().is_empty())
    }

    /// The user's home directory from `HOME` (or `USERPROFILE` on Windows).
    pub(crate) fn home_dir(&self) -> Option<PathBuf> {
        self.var("HOME")
            .or_else(|| self.var("USERPROFILE"))
            .map(PathBuf::from)
    }

    /// Resolve a Docker endpoint, or `None` when nothing reachable was found.
    #[must_use]
    pub fn docker_endpoint(&self) -> Option<EngineEndpoint> {
        if let Some(endpoint) = self.docker_env_override() {
            debug!(%endpoint, "using Docker endpoint from environment");
            return Some(endpoint);
        }

        if let Some(path) = self.first_socket(&self.docker_socket_candidates()) {
            return Some(EngineEndpoint::unix_socket(&path));
        }

        // Docker Desktop and Windows pipes do not always expose a socket file.
        let fallback = match self.platform {
            Platform::Windows => EngineEndpoint::named_pipe(DOCKER_PIPE),
            Platform::MacOs => EngineEndpoint::unix_socket(Path::new("/var/run/docker.sock")),
            Platform::Linux => return None,
        };
        self.probe.ping(&fallback).then_some(fallback)
    }

    /// Resolve a Podman endpoint and its rootless flag.
    ///
    /// May activate the Podman service once when a socket is expected but
    /// absent.
    #[must_use]
    pub fn podman_endpoint(&self) -> Option<PodmanEndpoint> {
        if let Some(endpoint) = self.podman_env_override() {
            debug!(%endpoint, "using Podman endpoint from environment");
            let rootless = self.platform.uses_podman_machine() || !self.probe.is_root();
            return Some(PodmanEndpoint { endpoint, rootless });
        }

        if self.platform.uses_podman_machine() {
            return self.podman_machine_endpoint();
        }

        self.podman_linux_endpoint()
    }

    fn docker_env_override(&self) -> Option<EngineEndpoint> {
        self.var(DOCKER_HOST_VAR)
            .filter(|value| !points_at_podman(value))
            .and_then(|value| EngineEndpoint::parse(&value))
    }

    fn podman_env_override(&self) -> Option<EngineEndpoint> {
        PODMAN_HOST_VARS
            .iter()
            .find_map(|name| self.var(name))
            .or_else(|| self.var(DOCKER_HOST_VAR).filter(|value| points_at_podman(value)))
            .and_then(|value| EngineEndpoint::parse(&value))
    }

    fn docker_socket_candidates(&self) -> Vec<PathBuf> {
        let home = self.home_dir();
        let mut candidates = Vec::new();
        match self.platform {
            Platform::Linux => {
                if let Some(home_dir) = &home {
                    candidates.push(home_dir.join(".docker/desktop/docker.sock"));
                }
                if let Some(runtime_dir) = self.runtime_dir() {
                    candidates.push(runtime_dir.join("docker.sock"));
                }
                candidates.extend(SYSTEM_DOCKER_SOCKETS.iter().map(PathBuf::from));
            }
            Platform::MacOs => {
                if let Some(home_dir) = &home {
                    candidates.push(home_dir.join(".docker/run/docker.sock"));
                    candidates.push(home_dir.join(".docker/desktop/docker.sock"));
                }
                candidates.push(PathBuf::from("/var/run/docker.sock"));
            }
            Platform::Windows => {}
        }
        candidates
    }

    /// `XDG_RUNTIME_DIR`, or `/run/user/<uid>` when unset.
    fn runtime_dir(&self) -> Option<PathBuf> {
        self.var("XDG_RUNTIME_DIR").map(PathBuf::from).or_else(|| {
            self.probe
                .user_id()
                .map(|uid| PathBuf::from(format!("/run/user/{uid}")))
        })
    }

    fn rootless_podman_socket(&self) -> Option<PathBuf> {
        self.runtime_dir()
            .map(|runtime_dir| runtime_dir.join("podman/podman.sock"))
    }

    fn podman_linux_endpoint(&self) -> Option<PodmanEndpoint> {
        let rootless = !self.probe.is_root();
        let candidates: Vec<PathBuf> = if rootless {
            self.rootless_podman_socket().into_iter().collect()
        } else {
            ROOTFUL_PODMAN_SOCKETS.iter().map(PathBuf::from).collect()
        };

        let found = self.first_socket(&candidates).or_else(|| {
            if !self.probe.has_binary("podman") {
                return None;
            }
            self.activate_podman_socket(rootless);
            self.first_socket(&candidates)
        })?;

        Some(PodmanEndpoint {
            endpoint: EngineEndpoint::unix_socket(&found),
            rootless,
        })
    }

    fn activate_podman_socket(&self, rootless: bool) {
        let args: &[&str] = if rootless {
            &["--user", "start", "podman.socket"]
        } else {
            &["start", "podman.socket"]
        };
        info!(rootless, "activating podman.socket");
        if let Err(error) = self.probe.run("systemctl", args) {
            debug!(%error, "podman.socket activation failed");
        }
        self.probe.pause(ACTIVATION_DELAY);
    }

    fn podman_machine_endpoint(&self) -> Option<PodmanEndpoint> {
        if let Some(found) = self.locate_machine_endpoint() {
            return Some(found);
        }
        if !self.probe.has_binary("podman") {
            return None;
        }

        info!("starting podman machine");
        if let Err(error) = self.probe.run("podman", &["machine", "start"]) {
            debug!(%error, "podman machine start failed");
        }
        self.probe.pause(ACTIVATION_DELAY);
        self.locate_machine_endpoint()
    }

    /// Ask the machine for its connection, then fall back to convention paths.
    fn locate_machine_endpoint(&self) -> Option<PodmanEndpoint> {
        let connection = self
            .probe
            .run("podman", &["machine", "inspect"])
            .ok()
            .and_then(|output| parse_machine_inspect(&output));
        let rootless = connection.as_ref().is_none_or(|info| !info.rootful);

        let reported = connection.and_then(|info| match self.platform {
            Platform::Windows => info
                .pipe
                .as_deref()
                .and_then(pipe_name)
                .map(EngineEndpoint::named_pipe),
            Platform::MacOs | Platform::Linux => {
                info.socket.map(|path| EngineEndpoint::unix_socket(Path::new(&path)))
            }
        });

        reported
            .filter(|endpoint| self.validate(endpoint))
            .or_else(|| self.machine_convention_endpoint())
            .map(|endpoint| PodmanEndpoint { endpoint, rootless })
    }

    fn machine_convention_endpoint(&self) -> Option<EngineEndpoint> {
        match self.platform {
            Platform::Windows => {
                let pipe = EngineEndpoint::named_pipe(PODMAN_MACHINE_PIPE);
                self.probe.ping(&pipe).then_some(pipe)
            }
            Platform::MacOs | Platform::Linux => {
                let machine_dir = self
                    .home_dir()?
                    .join(".local/share/containers/podman/machine");
                let candidates = [
                    machine_dir.join("podman.sock"),
                    machine_dir.join("applehv/podman.sock"),
                    machine_dir.join("qemu/podman.sock"),
                    machine_dir.join(format!("{PODMAN_MACHINE_PIPE}/podman.sock")),
                ];
                self.first_socket(&candidates)
                    .map(|path| EngineEndpoint::unix_socket(&path))
            }
        }
    }

    /// Socket endpoints must be socket files; other transports must answer a ping.
    fn validate(&self, endpoint: &EngineEndpoint) -> bool {
        match endpoint.transport() {
            Transport::UnixSocket => endpoint
                .socket_path()
                .is_some_and(|path| self.probe.is_socket(&path)),
            Transport::NamedPipe | Transport::Http => self.probe.ping(endpoint),
        }
    }

    fn first_socket(&self, candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates
            .iter()
            .find(|path| self.probe.is_socket(path))
            .cloned()
    }
}

fn points_at_podman(value: &str) -> bool {
    value.to_ascii_lowercase().contains("podman")
}

#[cfg(test)]
pub(crate) mod fake;
