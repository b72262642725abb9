//! Recording host probe shared by detection and engine tests.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use mockable::MockEnv;

use super::HostProbe;
use crate::engine::connection::EngineEndpoint;

/// Probe whose answers are fixed up front and whose commands are recorded.
#[derive(Default)]
pub(crate) struct FakeProbe {
    pub(crate) sockets: Mutex<HashSet<PathBuf>>,
    /// Sockets that appear once any activation command has run.
    pub(crate) sockets_after_activation: Vec<PathBuf>,
    pub(crate) pingable: HashSet<String>,
    pub(crate) root: bool,
    pub(crate) uid: Option<u32>,
    pub(crate) binaries: HashSet<&'static str>,
    pub(crate) machine_inspect: Option<String>,
    pub(crate) commands: Mutex<Vec<String>>,
    pub(crate) pauses: Mutex<Vec<Duration>>,
}

impl FakeProbe {
    pub(crate) fn with_sockets(paths: &[&str]) -> Self {
        Self {
            sockets: Mutex::new(paths.iter().map(PathBuf::from).collect()),
            uid: Some(1000),
            ..Self::default()
        }
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    pub(crate) fn pause_count(&self) -> usize {
        self.pauses.lock().map(|pauses| pauses.len()).unwrap_or_default()
    }
}

impl HostProbe for FakeProbe {
    fn is_socket(&self, path: &Path) -> bool {
        self.sockets
            .lock()
            .is_ok_and(|sockets| sockets.contains(path))
    }

    fn is_root(&self) -> bool {
        self.root
    }

    fn user_id(&self) -> Option<u32> {
        self.uid
    }

    fn has_binary(&self, name: &str) -> bool {
        self.binaries.contains(name)
    }

    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        let command = format!("{program} {}", args.join(" "));
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.clone());
        }

        if command == "podman machine inspect" {
            return self
                .machine_inspect
                .clone()
                .ok_or_else(|| io::Error::other("no machine"));
        }

        if let Ok(mut sockets) = self.sockets.lock() {
            sockets.extend(self.sockets_after_activation.iter().cloned());
        }
        Ok(String::new())
    }

    fn ping(&self, endpoint: &EngineEndpoint) -> bool {
        self.pingable.contains(endpoint.uri())
    }

    fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
    }
}

/// Environment answering only the listed variables.
pub(crate) fn env_with(vars: &'static [(&'static str, &'static str)]) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| String::from(*value))
    });
    env
}
