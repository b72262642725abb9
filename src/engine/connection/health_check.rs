//! Connectivity probes for container engines.
//!
//! Probes use a short fixed timeout so a hung daemon cannot stall detection.

use std::time::Duration;

use bollard::Docker;

use super::{EngineConnector, EngineEndpoint, HEALTH_CHECK_TIMEOUT_SECS};
use crate::error::{EngineError, RfswiftError};

impl EngineConnector {
    /// Perform a ping with timeout (internal helper).
    async fn ping_with_timeout(docker: &Docker) -> Result<(), RfswiftError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| {
                RfswiftError::from(EngineError::HealthCheckTimeout {
                    seconds: HEALTH_CHECK_TIMEOUT_SECS,
                })
            })?
            .map_err(|e| {
                RfswiftError::from(EngineError::HealthCheckFailed {
                    message: e.to_string(),
                })
            })?;
        Ok(())
    }

    /// Verify the container engine is responsive (async version).
    ///
    /// # Errors
    ///
    /// Returns `EngineError::HealthCheckFailed` if the engine does not
    /// respond correctly.
    ///
    /// Returns `EngineError::HealthCheckTimeout` if the check times out.
    pub async fn health_check_async(docker: &Docker) -> Result<(), RfswiftError> {
        Self::ping_with_timeout(docker).await
    }

    /// Connect to `endpoint` and verify the engine responds (async version).
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::connect`] and [`Self::health_check_async`].
    pub async fn connect_and_verify_async(
        endpoint: &EngineEndpoint,
    ) -> Result<Docker, RfswiftError> {
        let docker = Self::connect(endpoint)?;
        Self::ping_with_timeout(&docker).await?;
        Ok(docker)
    }

    /// Create a tokio runtime for synchronous operations.
    pub(crate) fn create_runtime() -> Result<tokio::runtime::Runtime, RfswiftError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                RfswiftError::from(EngineError::RuntimeCreationFailed {
                    message: e.to_string(),
                })
            })
    }
}

/// Ping `endpoint` from a blocking context.
///
/// The probe runs on a dedicated thread with its own runtime, so it is safe to
/// call both from plain threads and from inside an existing Tokio runtime.
pub(crate) fn ping_blocking(endpoint: &EngineEndpoint) -> Result<(), RfswiftError> {
    std::thread::scope(|scope| {
        scope
            .spawn(|| {
                let runtime = EngineConnector::create_runtime()?;
                runtime.block_on(EngineConnector::connect_and_verify_async(endpoint))?;
                Ok(())
            })
            .join()
            .unwrap_or_else(|_| {
                Err(RfswiftError::from(EngineError::HealthCheckFailed {
                    message: String::from("probe thread panicked"),
                }))
            })
    })
}
