//! Engine selection and service control.

use std::path::PathBuf;

use tracing::info;

use crate::config::AppConfig;
use crate::engine::{EngineKind, EngineSelector};
use crate::error::Result as RfswiftResult;

use super::CommandOutcome;

/// A snapshot of the resolved engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    /// Resolved backend.
    pub kind: EngineKind,
    /// Preference the backend was resolved from.
    pub preferred: EngineKind,
    /// Human-readable backend name.
    pub name: &'static str,
    /// Detected endpoint URI.
    pub endpoint: Option<String>,
    /// Whether an endpoint was detected.
    pub available: bool,
    /// Whether the service answered a ping.
    pub service_running: bool,
    /// Root of the backend's container storage.
    pub storage_root: PathBuf,
    /// Whether container configuration may be edited on disk.
    pub supports_direct_config_edit: bool,
}

/// Applies the configured engine preference, if any, before first use.
///
/// Without a configured engine the selector falls back to `RFSWIFT_ENGINE`,
/// then to automatic selection.
pub fn configure_engine(selector: &EngineSelector, config: &AppConfig) {
    if let Some(kind) = config.engine {
        selector.set_preferred(kind);
    }
}

/// Resolves the engine and reports what was found.
#[must_use]
pub fn engine_info(selector: &EngineSelector) -> EngineInfo {
    let engine = selector.resolve();
    EngineInfo {
        kind: engine.kind(),
        preferred: selector.preferred(),
        name: engine.name(),
        endpoint: engine.endpoint().map(|endpoint| String::from(endpoint.uri())),
        available: engine.is_available(),
        service_running: engine.is_service_running(),
        storage_root: engine.storage_root(),
        supports_direct_config_edit: engine.supports_direct_config_edit(),
    }
}

/// Starts the resolved engine's service.
///
/// # Errors
///
/// Returns `EngineError::ServiceControlFailed` when the service command
/// fails.
pub fn start_engine(selector: &EngineSelector) -> RfswiftResult<CommandOutcome> {
    let engine = selector.resolve();
    engine.start_service()?;
    info!(engine = engine.name(), "engine service started");
    Ok(CommandOutcome::Success)
}

/// Restarts the resolved engine's service.
///
/// # Errors
///
/// Returns `EngineError::ServiceControlFailed` or
/// `EngineError::UnsupportedPlatform`.
pub fn restart_engine(selector: &EngineSelector) -> RfswiftResult<CommandOutcome> {
    let engine = selector.resolve();
    engine.restart_service()?;
    info!(engine = engine.name(), "engine service restarted");
    Ok(CommandOutcome::Success)
}
