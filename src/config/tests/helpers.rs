//! Shared fixtures and helper functions for config tests.

use std::sync::Arc;

use mockable::MockEnv;
use ortho_config::MergeComposer;
use rstest::fixture;

use crate::config::{AppConfig, DEFAULT_NETWORK_MODE, DEFAULT_USB_BINDING, DEFAULT_X11_BINDING};
use crate::session::DEFAULT_SHELL;

/// Fixture providing an `AppConfig` parsed from a full TOML example.
#[fixture]
pub fn app_config_from_full_toml() -> AppConfig {
    let toml = r#"
        engine = "podman"
        image = "penthertz/rfswift:sdr_full"

        [session]
        shell = "/bin/zsh"
        network_mode = "bridge"
        privileged = true
        x11_binding = "/tmp/.X11-unix:/tmp/.X11-unix:ro"
        usb_binding = ""
        extra_bindings = "/dev/snd:/dev/snd,/opt/captures:/root/captures"
        extra_hosts = ["sdr.local:192.168.1.20"]
        display = ":1"
        working_dir = "/root"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Fixture providing an `AppConfig` parsed from a minimal TOML example.
#[fixture]
pub fn app_config_from_partial_toml() -> AppConfig {
    let toml = r#"
        image = "penthertz/rfswift:wifi"
    "#;

    toml::from_str(toml).expect("TOML parsing should succeed")
}

/// Helper: Creates a `MergeComposer` with defaults layer already pushed.
pub fn create_composer_with_defaults() -> Result<MergeComposer, serde_json::Error> {
    let mut composer = MergeComposer::new();
    let defaults = ortho_config::serde_json::to_value(AppConfig::default())?;
    composer.push_defaults(defaults);
    Ok(composer)
}

/// Helper: Merges layers from a composer into `AppConfig`.
pub fn merge_config(composer: MergeComposer) -> Result<AppConfig, Arc<ortho_config::OrthoError>> {
    AppConfig::merge_from_layers(composer.layers())
}

/// Helper: Asserts that a config has all default values.
pub fn assert_config_has_defaults(config: &AppConfig) {
    assert!(config.engine.is_none(), "engine should be None");
    assert!(config.image.is_none(), "image should be None");
    assert_eq!(config.session.shell, DEFAULT_SHELL);
    assert_eq!(config.session.network_mode, DEFAULT_NETWORK_MODE);
    assert!(!config.session.privileged, "session.privileged should be false");
    assert_eq!(config.session.x11_binding, DEFAULT_X11_BINDING);
    assert_eq!(config.session.usb_binding, DEFAULT_USB_BINDING);
    assert!(config.session.extra_bindings.is_empty());
    assert!(config.session.extra_hosts.is_empty());
    assert!(config.session.display.is_none());
}

/// Helper: Creates a `MergeComposer` with defaults, file, and env layers.
pub fn create_composer_with_file_and_env() -> Result<MergeComposer, serde_json::Error> {
    use ortho_config::serde_json::json;

    let mut composer = create_composer_with_defaults()?;

    composer.push_file(
        json!({
            "engine": "docker",
            "image": "file-image:latest",
            "session": { "shell": "/bin/sh" }
        }),
        None,
    );

    composer.push_environment(json!({
        "image": "env-image:latest"
    }));

    Ok(composer)
}

/// Helper: A mock environment exposing exactly `vars`.
pub fn env_with(vars: &'static [(&'static str, &'static str)]) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| String::from(*value))
    });
    env
}

