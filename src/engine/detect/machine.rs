//! Parsing of `podman machine inspect` output.
//!
//! Newer Podman releases print a JSON array of machines; older ones print a
//! single object. Both shapes carry the connection paths under
//! `ConnectionInfo`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MachineInspect {
    #[serde(default)]
    connection_info: Option<ConnectionInfo>,
    #[serde(default)]
    rootful: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConnectionInfo {
    #[serde(default)]
    podman_socket: Option<PathField>,
    #[serde(default)]
    podman_pipe: Option<PathField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PathField {
    #[serde(default)]
    path: Option<String>,
}

/// Connection details reported by the Podman machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MachineConnection {
    pub(crate) socket: Option<String>,
    pub(crate) pipe: Option<String>,
    pub(crate) rootful: bool,
}

/// Parse machine inspect output, trying the array shape first.
///
/// Returns `None` when neither shape parses or no connection path is present.
pub(crate) fn parse_machine_inspect(output: &str) -> Option<MachineConnection> {
    let inspect = serde_json::from_str::<Vec<MachineInspect>>(output)
        .ok()
        .and_then(|machines| machines.into_iter().next())
        .or_else(|| serde_json::from_str::<MachineInspect>(output).ok())?;

    let info = inspect.connection_info?;
    let socket = info
        .podman_socket
        .and_then(|field| field.path)
        .filter(|path| !path.is_empty());
    let pipe = info
        .podman_pipe
        .and_then(|field| field.path)
        .filter(|path| !path.is_empty());
    if socket.is_none() && pipe.is_none() {
        return None;
    }

    Some(MachineConnection {
        socket,
        pipe,
        rootful: inspect.rootful.unwrap_or(false),
    })
}

/// Extract the pipe name from a Windows pipe path such as
/// `\\.\pipe\podman-machine-default` or `//./pipe/podman-machine-default`.
pub(crate) fn pipe_name(path: &str) -> Option<&str> {
    let normalised = path.trim_start_matches("npipe:");
    ["\\\\.\\pipe\\", "//./pipe/", "////./pipe/"]
        .iter()
        .find_map(|prefix| normalised.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{MachineConnection, parse_machine_inspect, pipe_name};
    use rstest::rstest;

    const ARRAY_FORMAT: &str = r#"[
        {
            "ConnectionInfo": {
                "PodmanSocket": {"Path": "/Users/ana/.local/share/containers/podman/machine/applehv/podman.sock"},
                "PodmanPipe": null
            },
            "Name": "podman-machine-default",
            "Rootful": false,
            "State": "running"
        }
    ]"#;

    const OBJECT_FORMAT: &str = r#"{
        "ConnectionInfo": {
            "PodmanPipe": {"Path": "\\\\.\\pipe\\podman-machine-default"}
        },
        "Rootful": true
    }"#;

    #[rstest]
    fn parses_array_format() {
        assert_eq!(
            parse_machine_inspect(ARRAY_FORMAT),
            Some(MachineConnection {
                socket: Some(String::from(
                    "/Users/ana/.local/share/containers/podman/machine/applehv/podman.sock"
                )),
                pipe: None,
                rootful: false,
            })
        );
    }

    #[rstest]
    fn falls_back_to_single_object_format() {
        let connection = parse_machine_inspect(OBJECT_FORMAT);
        assert_eq!(
            connection.as_ref().and_then(|c| c.pipe.as_deref()),
            Some("\\\\.\\pipe\\podman-machine-default")
        );
        assert_eq!(connection.map(|c| c.rootful), Some(true));
    }

    #[rstest]
    #[case("")]
    #[case("Error: no machine found")]
    #[case("[]")]
    #[case(r#"[{"Name": "podman-machine-default"}]"#)]
    fn unparsable_or_empty_output_yields_none(#[case] output: &str) {
        assert!(parse_machine_inspect(output).is_none());
    }

    #[rstest]
    #[case("\\\\.\\pipe\\podman-machine-default", Some("podman-machine-default"))]
    #[case("//./pipe/docker_engine", Some("docker_engine"))]
    #[case("npipe:////./pipe/podman-machine-default", Some("podman-machine-default"))]
    #[case("/tmp/podman.sock", None)]
    fn extracts_pipe_names(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(pipe_name(path), expected);
    }
}
