//! Host probing seam used by socket detection and service control.

use std::io;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use crate::engine::connection::{EngineEndpoint, ping_blocking};

/// Operating system family, passed explicitly so every convention path can be
/// exercised from any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux and other Unix-likes using systemd conventions.
    Linux,
    /// macOS, where Podman runs inside a managed VM.
    MacOs,
    /// Windows, where engines are reached through named pipes.
    Windows,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Whether Podman on this platform lives inside a `podman machine` VM.
    #[must_use]
    pub const fn uses_podman_machine(self) -> bool {
        matches!(self, Self::MacOs | Self::Windows)
    }
}

/// Side-effecting host queries needed by detection.
///
/// This abstraction keeps detection testable without real sockets, binaries,
/// or daemons.
pub trait HostProbe: Send + Sync {
    /// Whether `path` exists and is a socket special file.
    fn is_socket(&self, path: &Path) -> bool;

    /// Whether the process runs with an effective user ID of root.
    fn is_root(&self) -> bool;

    /// The real user ID, when the platform has one.
    fn user_id(&self) -> Option<u32>;

    /// Whether `name` resolves to an executable on `PATH`.
    fn has_binary(&self, name: &str) -> bool;

    /// Run `program` with `args`, returning stdout when it exits successfully.
    ///
    /// # Errors
    ///
    /// Returns an error when the program cannot be spawned or exits non-zero;
    /// the message carries the program's stderr.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<String>;

    /// Whether the engine at `endpoint` answers a ping within the probe timeout.
    fn ping(&self, endpoint: &EngineEndpoint) -> bool;

    /// Block for `duration`; used for the single activation wait.
    fn pause(&self, duration: Duration);
}

/// [`HostProbe`] backed by the real operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostProbe;

impl HostProbe for SystemHostProbe {
    #[cfg(unix)]
    fn is_socket(&self, path: &Path) -> bool {
        use std::os::unix::fs::FileTypeExt;

        std::fs::metadata(path).is_ok_and(|metadata| metadata.file_type().is_socket())
    }

    #[cfg(not(unix))]
    fn is_socket(&self, _path: &Path) -> bool {
        false
    }

    #[cfg(unix)]
    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    fn is_root(&self) -> bool {
        false
    }

    #[cfg(unix)]
    fn user_id(&self) -> Option<u32> {
        Some(nix::unistd::getuid().as_raw())
    }

    #[cfg(not(unix))]
    fn user_id(&self) -> Option<u32> {
        None
    }

    fn has_binary(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn run(&self, program: &str, args: &[&str]) -> io::Result<String> {
        debug!(program, ?args, "running host command");
        let output = Command::new(program).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(io::Error::other)
    }

    fn ping(&self, endpoint: &EngineEndpoint) -> bool {
        match ping_blocking(endpoint) {
            Ok(()) => true,
            Err(error) => {
                debug!(%endpoint, %error, "engine ping failed");
                false
            }
        }
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
