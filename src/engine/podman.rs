//! Podman backend.
//!
//! The detected endpoint and rootless flag are computed lazily and cached for
//! the life of the process. The cache is only refreshed by
//! [`PodmanEngine::redetect`], which service control calls after starting a
//! Podman machine.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use bollard::Docker;
use tracing::debug;

use super::connection::{EngineConnector, EngineEndpoint};
use super::detect::{Platform, PodmanEndpoint, SocketDetector};
use super::service::run_service_command;
use super::{Engine, EngineKind};
use crate::error::{EngineError, RfswiftError};

/// Storage root used by a rootful Podman service.
pub const ROOTFUL_STORAGE_ROOT: &str = "/var/lib/containers/storage";

/// Storage root of a rootless Podman service, relative to the home directory.
pub const ROOTLESS_STORAGE_SUFFIX: &str = ".local/share/containers/storage";

#[derive(Debug, Clone)]
enum Detection {
    Pending,
    Resolved(Option<PodmanEndpoint>),
}

/// Podman, rootless or rootful, native or inside a `podman machine` VM.
pub struct PodmanEngine<E: mockable::Env> {
    detector: Arc<SocketDetector<E>>,
    detection: RwLock<Detection>,
}

impl<E: mockable::Env> PodmanEngine<E> {
    /// Creates a Podman backend sharing `detector`.
    #[must_use]
    pub const fn new(detector: Arc<SocketDetector<E>>) -> Self {
        Self {
            detector,
            detection: RwLock::new(Detection::Pending),
        }
    }

    /// Returns the cached detection result, detecting on first use.
    fn detected(&self) -> Option<PodmanEndpoint> {
        {
            let cached = self
                .detection
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Detection::Resolved(found) = &*cached {
                return found.clone();
            }
        }

        let mut cached = self
            .detection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Detection::Resolved(found) = &*cached {
            return found.clone();
        }
        let found = self.detector.podman_endpoint();
        debug!(?found, "podman detection complete");
        *cached = Detection::Resolved(found.clone());
        found
    }

    /// Discards the cached endpoint and detects again.
    ///
    /// Returns the freshly detected endpoint, if any.
    pub fn redetect(&self) -> Option<PodmanEndpoint> {
        let mut cached = self
            .detection
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let found = self.detector.podman_endpoint();
        debug!(?found, "podman re-detection complete");
        *cached = Detection::Resolved(found.clone());
        found
    }

    /// Whether Podman runs unprivileged.
    ///
    /// Falls back to the process privilege level when no endpoint was found.
    #[must_use]
    pub fn is_rootless(&self) -> bool {
        self.detected().map_or_else(
            || self.detector.platform().uses_podman_machine() || !self.detector.probe().is_root(),
            |found| found.rootless,
        )
    }

    fn socket_unit(&self, action: &str) -> Result<(), RfswiftError> {
        let args: &[&str] = if self.is_rootless() {
            &["--user", action, "podman.socket"]
        } else {
            &[action, "podman.socket"]
        };
        run_service_command(self.detector.probe(), self.kind(), action, "systemctl", args)
    }

    fn machine(&self, action: &str, verb: &str) -> Result<(), RfswiftError> {
        run_service_command(
            self.detector.probe(),
            self.kind(),
            action,
            "podman",
            &["machine", verb],
        )
    }
}

impl<E: mockable::Env> fmt::Debug for PodmanEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodmanEngine")
            .field("platform", &self.detector.platform())
            .field("detection", &self.detection)
            .finish_non_exhaustive()
    }
}

impl<E: mockable::Env + Send + Sync> Engine for PodmanEngine<E> {
    fn kind(&self) -> EngineKind {
        EngineKind::Podman
    }

    fn name(&self) -> &'static str {
        "Podman"
    }

    fn is_available(&self) -> bool {
        self.detected().is_some()
    }

    fn is_service_running(&self) -> bool {
        self.endpoint()
            .is_some_and(|endpoint| self.detector.probe().ping(&endpoint))
    }

    fn endpoint(&self) -> Option<EngineEndpoint> {
        self.detected().map(|found| found.endpoint)
    }

    fn client(&self) -> Result<Docker, RfswiftError> {
        let endpoint = self.endpoint().ok_or_else(|| {
            RfswiftError::from(EngineError::Unavailable {
                engine: String::from(self.name()),
                message: String::from("no Podman socket, pipe, or machine was found"),
            })
        })?;
        EngineConnector::connect(&endpoint)
    }

    fn start_service(&self) -> Result<(), RfswiftError> {
        match self.detector.platform() {
            Platform::Linux => self.socket_unit("start"),
            Platform::MacOs | Platform::Windows => {
                self.machine("start", "start")?;
                self.redetect();
                Ok(())
            }
        }
    }

    fn restart_service(&self) -> Result<(), RfswiftError> {
        match self.detector.platform() {
            Platform::Linux => self.socket_unit("restart"),
            Platform::MacOs | Platform::Windows => {
                self.machine("restart", "stop")?;
                self.machine("restart", "start")?;
                self.redetect();
                Ok(())
            }
        }
    }

    fn container_config_paths(&self, container_id: &str) -> Vec<PathBuf> {
        vec![
            self.storage_root()
                .join("overlay-containers")
                .join(container_id)
                .join("userdata")
                .join("config.json"),
        ]
    }

    fn supports_direct_config_edit(&self) -> bool {
        false
    }

    fn storage_root(&self) -> PathBuf {
        if !self.is_rootless() {
            return PathBuf::from(ROOTFUL_STORAGE_ROOT);
        }
        self.detector.home_dir().map_or_else(
            || PathBuf::from(ROOTFUL_STORAGE_ROOT),
            |home| home.join(ROOTLESS_STORAGE_SUFFIX),
        )
    }
}
