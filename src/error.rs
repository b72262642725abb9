//! Semantic error types for the rfswift application.
//!
//! This module defines the error hierarchy for rfswift, following the principle
//! of using semantic error enums (via `thiserror`) for conditions the caller
//! might inspect or report differently, while reserving opaque errors
//! (`eyre::Report`) for the application boundary.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("missing required configuration: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised while locating, controlling, or connecting to an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Neither the requested engine nor its alternative could be reached.
    #[error("{engine} is not available on this host: {message}")]
    Unavailable {
        /// Display name of the engine.
        engine: String,
        /// What was missing.
        message: String,
    },

    /// Failed to connect to the container engine endpoint.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// Health check failed - engine did not respond correctly.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Health check timed out.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },

    /// A Tokio runtime could not be created for a blocking helper.
    #[error("failed to create async runtime: {message}")]
    RuntimeCreationFailed {
        /// A description of the runtime failure.
        message: String,
    },

    /// Starting, stopping, or restarting the engine service failed.
    #[error("failed to {action} {engine} service: {message}")]
    ServiceControlFailed {
        /// Display name of the engine.
        engine: String,
        /// The attempted action (`start`, `restart`).
        action: String,
        /// A description of the failure.
        message: String,
    },

    /// The requested engine operation has no implementation on this platform.
    #[error("{operation} is not supported on {platform}")]
    UnsupportedPlatform {
        /// The attempted operation.
        operation: String,
        /// The platform name.
        platform: String,
    },
}

/// Errors that can occur during container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Failed to create a container.
    #[error("failed to create container: {message}")]
    CreateFailed {
        /// A description of the creation failure.
        message: String,
    },

    /// Failed to start a container.
    #[error("failed to start container '{container_id}': {message}")]
    StartFailed {
        /// The ID of the container that failed to start.
        container_id: String,
        /// A description of the start failure.
        message: String,
    },

    /// Failed to attach to a container's primary process.
    #[error("failed to attach to container '{container_id}': {message}")]
    AttachFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the attach failure.
        message: String,
    },

    /// Failed to execute a command in a container.
    #[error("failed to execute command in container '{container_id}': {message}")]
    ExecFailed {
        /// The ID of the container.
        container_id: String,
        /// A description of the execution failure.
        message: String,
    },

    /// Waiting for the container's primary process failed.
    #[error("failed waiting for container '{container_id}': {message}")]
    WaitFailed {
        /// The ID of the container.
        container_id: String,
        /// The engine message.
        message: String,
    },

    /// No container matched the requested identifier.
    #[error("{}", not_found_message(.identifier, .available))]
    NotFound {
        /// The identifier or selector that missed.
        identifier: String,
        /// Names of the containers that were found instead.
        available: Vec<String>,
    },

    /// A one-shot engine operation (commit, tag, rename, ...) failed.
    #[error("{operation} failed for '{target}': {message}")]
    OperationFailed {
        /// The operation name.
        operation: String,
        /// The container or image the operation targeted.
        target: String,
        /// The engine message.
        message: String,
    },

    /// The local terminal could not be switched into or out of raw mode.
    #[error("terminal mode change failed: {message}")]
    TerminalFailed {
        /// A description of the terminal failure.
        message: String,
    },
}

fn not_found_message(identifier: &str, available: &[String]) -> String {
    if available.is_empty() {
        return format!("no container found for '{identifier}'");
    }

    format!(
        "no container found for '{identifier}'; available: {}",
        available.join(", ")
    )
}

/// Errors raised while classifying image freshness.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The host CPU architecture has no published image variant.
    #[error("unsupported architecture: {arch}")]
    UnsupportedArchitecture {
        /// The architecture reported by the host.
        arch: String,
    },

    /// Fetching remote tag metadata failed.
    #[error("failed to list tags for '{repository}': {message}")]
    RegistryFailed {
        /// The repository being queried.
        repository: String,
        /// A description of the failure.
        message: String,
    },

    /// Inspecting the local image failed.
    #[error("failed to inspect image '{image}': {message}")]
    InspectFailed {
        /// The local image reference.
        image: String,
        /// The engine message.
        message: String,
    },

    /// A timestamp could not be parsed.
    #[error("invalid timestamp '{value}': {message}")]
    InvalidTimestamp {
        /// The raw timestamp.
        value: String,
        /// The parse failure.
        message: String,
    },

    /// The image reference could not be split into repository and tag.
    #[error("invalid image reference: '{reference}'")]
    InvalidReference {
        /// The offending reference.
        reference: String,
    },
}

/// Top-level error type for the rfswift application.
///
/// This enum aggregates all domain-specific errors into a single type that can
/// be used throughout the application. At the application boundary (main.rs),
/// these errors are converted to `eyre::Report` for human-readable reporting.
#[derive(Debug, Error)]
pub enum RfswiftError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while reaching the container engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An error occurred during container operations.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// An error occurred while checking an image.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl RfswiftError {
    /// Returns `true` for lookup misses the CLI reports without failing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Container(ContainerError::NotFound { .. }))
    }
}

/// A specialised `Result` type for rfswift operations.
pub type Result<T> = std::result::Result<T, RfswiftError>;
