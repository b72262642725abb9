//! Container engine detection, capabilities, and selection.
//!
//! Docker and Podman speak the same API, so both backends hand out a Bollard
//! client. They differ in where their endpoints live, how their services are
//! started, and how they lay out container state on disk. [`Engine`] exposes
//! those differences as capabilities so callers never branch on the backend's
//! identity.
//!
//! Endpoints are resolved through a priority-based fallback chain:
//!
//! 1. `PODMAN_HOST`, then `CONTAINER_HOST` (Podman only)
//! 2. `DOCKER_HOST`, when it points at the engine being resolved
//! 3. OS convention paths, most specific first
//! 4. For Podman on macOS and Windows, the machine's reported connection

mod connection;
mod detect;
mod docker;
mod kind;
mod podman;
pub mod selector;
mod service;

use std::fmt;
use std::path::PathBuf;

use bollard::Docker;

use crate::error::RfswiftError;

pub use connection::{EngineConnector, EngineEndpoint, Transport};
pub use detect::{
    ACTIVATION_DELAY, DOCKER_HOST_VAR, HostProbe, Platform, PodmanEndpoint, SocketDetector,
    SystemHostProbe,
};
pub use docker::{DOCKER_STORAGE_ROOT, DockerEngine};
pub use kind::EngineKind;
pub use podman::{PodmanEngine, ROOTFUL_STORAGE_ROOT, ROOTLESS_STORAGE_SUFFIX};
pub use selector::{ENGINE_PREFERENCE_VAR, EngineFactory, EngineSelector, SystemEngineFactory};

/// Capabilities shared by every container engine backend.
pub trait Engine: Send + Sync + fmt::Debug {
    /// The concrete backend; never [`EngineKind::Auto`].
    fn kind(&self) -> EngineKind;

    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Whether an endpoint for this backend was detected.
    fn is_available(&self) -> bool;

    /// Whether the backend's service answers a ping.
    fn is_service_running(&self) -> bool;

    /// The detected endpoint, if any.
    fn endpoint(&self) -> Option<EngineEndpoint>;

    /// Builds an API client for the detected endpoint.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Unavailable` when no endpoint was detected, or
    /// the connection errors of [`EngineConnector::connect`].
    fn client(&self) -> Result<Docker, RfswiftError>;

    /// Starts the backend's service.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ServiceControlFailed` when the service command
    /// fails.
    fn start_service(&self) -> Result<(), RfswiftError>;

    /// Restarts the backend's service.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ServiceControlFailed` when a service command
    /// fails, or `EngineError::UnsupportedPlatform` when restarting is not
    /// possible here.
    fn restart_service(&self) -> Result<(), RfswiftError>;

    /// On-disk configuration files of a container.
    fn container_config_paths(&self, container_id: &str) -> Vec<PathBuf>;

    /// Whether container configuration may be edited on disk directly.
    fn supports_direct_config_edit(&self) -> bool;

    /// Root of the backend's container storage.
    fn storage_root(&self) -> PathBuf;
}
