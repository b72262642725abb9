//! Docker backend.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bollard::Docker;

use super::connection::{EngineConnector, EngineEndpoint};
use super::detect::{Platform, SocketDetector};
use super::service::{run_service_command, unsupported};
use super::{Engine, EngineKind};
use crate::error::{EngineError, RfswiftError};

/// Root of Docker's on-disk state.
pub const DOCKER_STORAGE_ROOT: &str = "/var/lib/docker";

/// Docker Engine or Docker Desktop.
///
/// The endpoint is detected on every call; Docker has no rootless state to
/// cache.
pub struct DockerEngine<E: mockable::Env> {
    detector: Arc<SocketDetector<E>>,
}

impl<E: mockable::Env> DockerEngine<E> {
    /// Creates a Docker backend sharing `detector`.
    #[must_use]
    pub const fn new(detector: Arc<SocketDetector<E>>) -> Self {
        Self { detector }
    }
}

impl<E: mockable::Env> fmt::Debug for DockerEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerEngine")
            .field("platform", &self.detector.platform())
            .finish_non_exhaustive()
    }
}

impl<E: mockable::Env + Send + Sync> Engine for DockerEngine<E> {
    fn kind(&self) -> EngineKind {
        EngineKind::Docker
    }

    fn name(&self) -> &'static str {
        "Docker"
    }

    fn is_available(&self) -> bool {
        self.endpoint().is_some()
    }

    fn is_service_running(&self) -> bool {
        self.endpoint()
            .is_some_and(|endpoint| self.detector.probe().ping(&endpoint))
    }

    fn endpoint(&self) -> Option<EngineEndpoint> {
        self.detector.docker_endpoint()
    }

    fn client(&self) -> Result<Docker, RfswiftError> {
        let endpoint = self.endpoint().ok_or_else(|| {
            RfswiftError::from(EngineError::Unavailable {
                engine: String::from(self.name()),
                message: String::from("no Docker socket or pipe was found"),
            })
        })?;
        EngineConnector::connect(&endpoint)
    }

    fn start_service(&self) -> Result<(), RfswiftError> {
        let probe = self.detector.probe();
        match self.detector.platform() {
            Platform::Linux => {
                run_service_command(probe, self.kind(), "start", "systemctl", &["start", "docker"])
            }
            Platform::MacOs => {
                run_service_command(probe, self.kind(), "start", "open", &["-a", "Docker"])
            }
            Platform::Windows => run_service_command(
                probe,
                self.kind(),
                "start",
                "cmd",
                &["/C", "start", "", "Docker Desktop"],
            ),
        }
    }

    fn restart_service(&self) -> Result<(), RfswiftError> {
        let probe = self.detector.probe();
        match self.detector.platform() {
            Platform::Linux => run_service_command(
                probe,
                self.kind(),
                "restart",
                "systemctl",
                &["restart", "docker"],
            ),
            Platform::MacOs => {
                run_service_command(
                    probe,
                    self.kind(),
                    "restart",
                    "osascript",
                    &["-e", "quit app \"Docker\""],
                )?;
                run_service_command(probe, self.kind(), "restart", "open", &["-a", "Docker"])
            }
            platform @ Platform::Windows => Err(unsupported("Docker Desktop restart", platform)),
        }
    }

    fn container_config_paths(&self, container_id: &str) -> Vec<PathBuf> {
        let container_dir = self.storage_root().join("containers").join(container_id);
        vec![
            container_dir.join("hostconfig.json"),
            container_dir.join("config.v2.json"),
        ]
    }

    fn supports_direct_config_edit(&self) -> bool {
        true
    }

    fn storage_root(&self) -> PathBuf {
        PathBuf::from(DOCKER_STORAGE_ROOT)
    }
}
