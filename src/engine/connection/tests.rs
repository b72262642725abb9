//! Unit tests for endpoint parsing and container engine connection.

use std::path::{Path, PathBuf};

use rstest::rstest;

use super::{EngineConnector, EngineEndpoint, Transport};
use crate::error::{EngineError, RfswiftError};

#[rstest]
#[case("unix:///var/run/docker.sock", "unix:///var/run/docker.sock", Transport::UnixSocket)]
#[case("/run/podman/podman.sock", "unix:///run/podman/podman.sock", Transport::UnixSocket)]
#[case("npipe:////./pipe/docker_engine", "npipe:////./pipe/docker_engine", Transport::NamedPipe)]
#[case("//./pipe/podman-machine-default", "npipe:////./pipe/podman-machine-default", Transport::NamedPipe)]
#[case("tcp://host:2375", "http://host:2375", Transport::Http)]
#[case("https://remote:2376", "https://remote:2376", Transport::Http)]
fn parse_normalises_endpoints(
    #[case] raw: &str,
    #[case] expected_uri: &str,
    #[case] expected_transport: Transport,
) {
    let endpoint = EngineEndpoint::parse(raw);
    assert_eq!(
        endpoint.as_ref().map(EngineEndpoint::uri),
        Some(expected_uri)
    );
    assert_eq!(
        endpoint.map(|value| value.transport()),
        Some(expected_transport)
    );
}

#[rstest]
#[case("")]
#[case("   ")]
fn parse_rejects_blank_input(#[case] raw: &str) {
    assert!(EngineEndpoint::parse(raw).is_none());
}

#[rstest]
fn socket_path_is_only_reported_for_unix_sockets() {
    let unix = EngineEndpoint::unix_socket(Path::new("/run/user/1000/podman/podman.sock"));
    let pipe = EngineEndpoint::named_pipe("docker_engine");
    assert_eq!(
        unix.socket_path(),
        Some(PathBuf::from("/run/user/1000/podman/podman.sock"))
    );
    assert_eq!(pipe.socket_path(), None);
    assert_eq!(pipe.uri(), "npipe:////./pipe/docker_engine");
}

#[rstest]
fn connect_tcp_endpoint_creates_client() {
    // Bollard's connect_with_http only builds the client configuration, so this
    // succeeds without a daemon.
    let endpoint = EngineEndpoint::parse("tcp://192.168.1.100:2376").expect("endpoint should parse");
    let result = EngineConnector::connect(&endpoint);
    assert!(result.is_ok(), "tcp endpoint should create client: {result:?}");
}

#[rstest]
#[cfg(unix)]
fn connect_missing_unix_socket_reports_socket_not_found() {
    let endpoint = EngineEndpoint::unix_socket(Path::new("/nonexistent/rfswift/test.sock"));
    match EngineConnector::connect(&endpoint) {
        Err(RfswiftError::Engine(EngineError::SocketNotFound { path })) => {
            assert_eq!(path, PathBuf::from("/nonexistent/rfswift/test.sock"));
        }
        Err(RfswiftError::Engine(EngineError::ConnectionFailed { .. })) | Ok(_) => {
            // Some Bollard versions defer socket checks to the first request.
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
}
