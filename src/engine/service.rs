//! Shared helpers for engine service control.

use crate::engine::EngineKind;
use crate::engine::detect::{HostProbe, Platform};
use crate::error::{EngineError, RfswiftError};

/// Runs one service-control command, mapping failure to
/// `EngineError::ServiceControlFailed`.
pub(crate) fn run_service_command(
    probe: &dyn HostProbe,
    engine: EngineKind,
    action: &str,
    program: &str,
    args: &[&str],
) -> Result<(), RfswiftError> {
    tracing::info!(%engine, action, program, "controlling engine service");
    probe
        .run(program, args)
        .map(|_| ())
        .map_err(|error| service_failed(engine, action, error.to_string()))
}

pub(crate) fn service_failed(engine: EngineKind, action: &str, message: String) -> RfswiftError {
    RfswiftError::from(EngineError::ServiceControlFailed {
        engine: engine.to_string(),
        action: String::from(action),
        message,
    })
}

pub(crate) fn unsupported(operation: &str, platform: Platform) -> RfswiftError {
    RfswiftError::from(EngineError::UnsupportedPlatform {
        operation: String::from(operation),
        platform: format!("{platform:?}"),
    })
}
