//! Turns Bollard client-construction failures into engine errors.
//!
//! Only Unix sockets have a filesystem path worth reporting. Named pipe and
//! HTTP failures keep the endpoint URI in the message instead.

use std::error::Error as StdError;
use std::io::{self, ErrorKind};

use bollard::errors::Error as BollardError;

use super::{EngineEndpoint, Transport};
use crate::error::EngineError;

/// Classify a failure to reach `endpoint` according to its transport.
pub(super) fn classify_connection_error(
    error: &BollardError,
    endpoint: &EngineEndpoint,
) -> EngineError {
    let kind = match error {
        BollardError::SocketNotFoundError(_) => Some(ErrorKind::NotFound),
        BollardError::IOError { err } => io_kind(err),
        other => io_kind(other),
    };

    match (endpoint.transport(), kind) {
        (Transport::UnixSocket, Some(ErrorKind::NotFound)) => endpoint
            .socket_path()
            .map_or_else(|| failed(endpoint, error), |path| EngineError::SocketNotFound { path }),
        (Transport::UnixSocket, Some(ErrorKind::PermissionDenied)) => endpoint
            .socket_path()
            .map_or_else(|| failed(endpoint, error), |path| EngineError::PermissionDenied { path }),
        (Transport::NamedPipe, Some(ErrorKind::NotFound)) => EngineError::ConnectionFailed {
            message: format!("named pipe {endpoint} does not exist; is the engine running?"),
        },
        (Transport::NamedPipe, Some(ErrorKind::PermissionDenied)) => EngineError::ConnectionFailed {
            message: format!("access to named pipe {endpoint} was denied"),
        },
        _ => failed(endpoint, error),
    }
}

fn failed(endpoint: &EngineEndpoint, error: &BollardError) -> EngineError {
    EngineError::ConnectionFailed {
        message: format!("{endpoint}: {error}"),
    }
}

/// The first `io::Error` kind in `error` or its source chain.
fn io_kind(error: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    std::iter::successors(Some(error), |current: &&(dyn StdError + 'static)| (*current).source())
        .find_map(|current| current.downcast_ref::<io::Error>().map(io::Error::kind))
}
