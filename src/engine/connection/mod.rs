//! Endpoint descriptors and container engine connection.
//!
//! Detection produces an [`EngineEndpoint`]; this module turns one into a
//! Bollard client. Docker and Podman share the same wire protocol, so a single
//! connector serves both backends and only the transport differs.

mod error_classification;
mod health_check;

use std::fmt;
use std::path::{Path, PathBuf};

use bollard::Docker;

use self::error_classification::classify_connection_error;
use crate::error::RfswiftError;

pub(crate) use self::health_check::ping_blocking;

/// Connection timeout in seconds for Docker/Podman API connections.
const CONNECTION_TIMEOUT_SECS: u64 = 120;

/// Timeout in seconds for connectivity probes.
pub(crate) const HEALTH_CHECK_TIMEOUT_SECS: u64 = 3;

/// How an endpoint is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// A Unix domain socket on the local filesystem.
    UnixSocket,
    /// A Windows named pipe.
    NamedPipe,
    /// An HTTP or HTTPS endpoint (`tcp://` is rewritten to `http://`).
    Http,
}

/// A connectable engine address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    uri: String,
    transport: Transport,
}

impl EngineEndpoint {
    /// Parse an endpoint from a URI or a bare path.
    ///
    /// Supported forms:
    /// - `unix:///path/to/socket`
    /// - `npipe:////./pipe/name`
    /// - `tcp://host:port` (treated as HTTP)
    /// - `http://host:port`, `https://host:port`
    /// - bare paths: `//` or `\\` prefixes are named pipes, anything else a
    ///   Unix socket. Detection is syntax-based, not platform-based.
    ///
    /// Returns `None` for empty input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        let endpoint = if value.starts_with("unix://") {
            Self::new(value, Transport::UnixSocket)
        } else if value.starts_with("npipe://") {
            Self::new(value, Transport::NamedPipe)
        } else if let Some(rest) = value.strip_prefix("tcp://") {
            Self::new(format!("http://{rest}"), Transport::Http)
        } else if value.starts_with("http://") || value.starts_with("https://") {
            Self::new(value, Transport::Http)
        } else if value.starts_with("\\\\") || value.starts_with("//") {
            Self::new(format!("npipe://{value}"), Transport::NamedPipe)
        } else {
            Self::new(format!("unix://{value}"), Transport::UnixSocket)
        };
        Some(endpoint)
    }

    /// Build a Unix socket endpoint from a filesystem path.
    #[must_use]
    pub fn unix_socket(path: &Path) -> Self {
        Self::new(format!("unix://{}", path.display()), Transport::UnixSocket)
    }

    /// Build a named pipe endpoint from a pipe name such as `docker_engine`.
    #[must_use]
    pub fn named_pipe(name: &str) -> Self {
        Self::new(format!("npipe:////./pipe/{name}"), Transport::NamedPipe)
    }

    fn new(uri: impl Into<String>, transport: Transport) -> Self {
        Self {
            uri: uri.into(),
            transport,
        }
    }

    /// Return the normalised URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Return the transport classification.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Return the socket file path for Unix socket endpoints.
    #[must_use]
    pub fn socket_path(&self) -> Option<PathBuf> {
        match self.transport {
            Transport::UnixSocket => self.uri.strip_prefix("unix://").map(PathBuf::from),
            Transport::NamedPipe | Transport::Http => None,
        }
    }
}

impl fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Provides methods to connect to Docker or Podman container engines.
pub struct EngineConnector;

impl EngineConnector {
    /// Connect to the container engine behind `endpoint`.
    ///
    /// Construction does not contact the daemon; use
    /// [`Self::health_check_async`] to verify it responds.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SocketNotFound` or `EngineError::PermissionDenied`
    /// when a Unix socket cannot be used, and `EngineError::ConnectionFailed`
    /// naming the endpoint for pipe, HTTP, and any other failures.
    pub fn connect(endpoint: &EngineEndpoint) -> Result<Docker, RfswiftError> {
        let uri = endpoint.uri();
        let result = match endpoint.transport() {
            Transport::UnixSocket | Transport::NamedPipe => {
                Docker::connect_with_socket(uri, CONNECTION_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            Transport::Http => {
                Docker::connect_with_http(uri, CONNECTION_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
        };

        result.map_err(|error| RfswiftError::from(classify_connection_error(&error, endpoint)))
    }
}

#[cfg(test)]
mod tests;
