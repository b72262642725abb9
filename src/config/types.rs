//! Configuration data types for rfswift.

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoResult, PostMergeContext, PostMergeHook};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::engine::EngineKind;
use crate::error::{ConfigError, RfswiftError};
use crate::session::{DEFAULT_SHELL, SessionConfig};

/// Default X11 socket binding.
pub const DEFAULT_X11_BINDING: &str = "/tmp/.X11-unix:/tmp/.X11-unix:rw";

/// Default USB bus binding.
pub const DEFAULT_USB_BINDING: &str = "/dev/bus/usb:/dev/bus/usb";

/// Default container network mode.
pub const DEFAULT_NETWORK_MODE: &str = "host";

/// Container session settings.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Shell started in new containers and exec sessions.
    #[default(String::from(DEFAULT_SHELL))]
    pub shell: String,

    /// Engine network mode.
    #[default(String::from(DEFAULT_NETWORK_MODE))]
    pub network_mode: String,

    /// Run containers in privileged mode.
    pub privileged: bool,

    /// X11 socket bind mount, mounted first.
    #[default(String::from(DEFAULT_X11_BINDING))]
    pub x11_binding: String,

    /// USB bus bind mount, mounted after X11.
    #[default(String::from(DEFAULT_USB_BINDING))]
    pub usb_binding: String,

    /// Comma-separated extra bind mounts, mounted last.
    pub extra_bindings: String,

    /// Environment entries in `KEY=value` form.
    pub env: Vec<String>,

    /// Extra `/etc/hosts` entries as `host:address`.
    pub extra_hosts: Vec<String>,

    /// `DISPLAY` value passed into the container.
    pub display: Option<String>,

    /// Working directory inside the container.
    pub working_dir: Option<Utf8PathBuf>,
}

/// Root application configuration.
///
/// This structure is loaded from configuration files, environment variables,
/// and command-line arguments with layered precedence. The precedence order
/// (lowest to highest) is: defaults, configuration file, environment variables,
/// command-line arguments.
///
/// Configuration files are discovered in this order:
/// 1. Path given with `--config`
/// 2. Path specified via `RFSWIFT_CONFIG_PATH` environment variable
/// 3. `.rfswift.toml` in the current working directory
/// 4. `.rfswift.toml` in the home directory
/// 5. `~/.config/rfswift/config.toml` (XDG default)
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "RFSWIFT",
    post_merge_hook,
    discovery(
        app_name = "rfswift",
        env_var = "RFSWIFT_CONFIG_PATH",
        config_file_name = "config.toml",
        dotfile_name = ".rfswift.toml",
        config_cli_long = "config",
        config_cli_visible = true,
    )
)]
pub struct AppConfig {
    /// Preferred container engine. `RFSWIFT_ENGINE` applies when unset.
    #[ortho_config(skip_cli)]
    pub engine: Option<EngineKind>,

    /// Container image used by `run`.
    pub image: Option<String>,

    /// Session settings.
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub session: SessionSettings,
}

impl AppConfig {
    /// Builds the session configuration for a new container.
    ///
    /// `DISPLAY` falls back to `host_display` when the configuration leaves it
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when no image is configured.
    pub fn session_config(
        &self,
        name: Option<String>,
        host_display: Option<String>,
    ) -> Result<SessionConfig, RfswiftError> {
        let image = self
            .image
            .as_deref()
            .filter(|image| !image.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                field: String::from("image"),
            })?;
        let settings = &self.session;

        Ok(SessionConfig::new(image)?
            .with_name(name)
            .with_shell(Some(settings.shell.clone()))
            .with_network_mode(Some(settings.network_mode.clone()))
            .with_privileged(settings.privileged)
            .with_x11_binding(settings.x11_binding.as_str())
            .with_usb_binding(settings.usb_binding.as_str())
            .with_extra_bindings(settings.extra_bindings.as_str())
            .with_env(settings.env.clone())
            .with_extra_hosts(
                settings
                    .extra_hosts
                    .iter()
                    .filter(|entry| !entry.trim().is_empty())
                    .cloned()
                    .collect(),
            )
            .with_display(settings.display.clone().or(host_display))
            .with_working_dir(settings.working_dir.as_ref().map(ToString::to_string)))
    }
}

impl PostMergeHook for AppConfig {
    fn post_merge(&mut self, _ctx: &PostMergeContext) -> OrthoResult<()> {
        if self.session.shell.trim().is_empty() {
            self.session.shell = String::from(DEFAULT_SHELL);
        }
        self.session
            .extra_hosts
            .retain(|entry| !entry.trim().is_empty());
        Ok(())
    }
}
