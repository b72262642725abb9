//! Configuration system for rfswift.
//!
//! This module provides the configuration structures and CLI definitions for
//! the rfswift binary. Layers are merged with `ortho_config`: CLI flags
//! override environment variables, which override configuration files, which
//! override defaults.
//!
//! The configuration file is expected at `~/.config/rfswift/config.toml` by
//! default.
//!
//! # Example Configuration
//!
//! ```toml
//! engine = "podman"
//! image = "penthertz/rfswift:sdr_full"
//!
//! [session]
//! shell = "/bin/zsh"
//! network_mode = "host"
//! privileged = false
//! x11_binding = "/tmp/.X11-unix:/tmp/.X11-unix:rw"
//! usb_binding = "/dev/bus/usb:/dev/bus/usb"
//! extra_bindings = "/run/user/1000/pulse:/run/user/1000/pulse"
//! extra_hosts = ["sdr.local:192.168.1.20"]
//! ```

mod cli;
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{
    Cli, Commands, CommitArgs, ContainerArgs, EngineAction, EngineArgs, ExecArgs, ImageArgs,
    RenameArgs, RunArgs, StatusArgs, TagArgs,
};
pub use loader::{env_var_names, load_config, load_config_with_env};
pub use types::{
    AppConfig, DEFAULT_NETWORK_MODE, DEFAULT_USB_BINDING, DEFAULT_X11_BINDING, SessionSettings,
};
