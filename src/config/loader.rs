//! Configuration loading with layered precedence.
//!
//! Precedence (lowest to highest): application defaults, configuration file,
//! environment variables, command-line arguments.
//!
//! # Why manual layer composition?
//!
//! The `OrthoConfig` derive can discover, read the environment and parse the
//! CLI on its own. This loader drives `MergeComposer` by hand instead:
//!
//! 1. **Subcommand separation**: `Cli` owns subcommand dispatch, while
//!    `AppConfig` only holds settings.
//! 2. **Fail-fast environment values**: Figment silently ignores unparseable
//!    values. Here a bad `RFSWIFT_SESSION_PRIVILEGED=maybe` is an error.
//! 3. **Discovery order**: `--config` wins over every discovered path.
//!
//! `RFSWIFT_ENGINE` is not read here. The engine selector consults it only
//! when no engine was configured.

use camino::Utf8PathBuf;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use mockable::{DefaultEnv, Env};
use ortho_config::discovery::ConfigDiscovery;
use ortho_config::serde_json::{self, Map, Value};
use ortho_config::{MergeComposer, toml};

use crate::config::{AppConfig, Cli};
use crate::error::{ConfigError, Result};

/// The type of value expected from an environment variable.
#[derive(Clone, Copy)]
enum EnvVarType {
    /// String value (always accepted).
    String,
    /// Boolean value (`true`/`false`). Invalid values return an error.
    Bool,
    /// Comma-separated list; blank segments are dropped.
    List,
}

/// Specification for a single environment variable mapping.
struct EnvVarSpec {
    env_var: &'static str,
    path: &'static [&'static str],
    var_type: EnvVarType,
}

const ENV_VAR_SPECS: &[EnvVarSpec] = &[
    EnvVarSpec {
        env_var: "RFSWIFT_IMAGE",
        path: &["image"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_SHELL",
        path: &["session", "shell"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_NETWORK_MODE",
        path: &["session", "network_mode"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_PRIVILEGED",
        path: &["session", "privileged"],
        var_type: EnvVarType::Bool,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_X11_BINDING",
        path: &["session", "x11_binding"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_USB_BINDING",
        path: &["session", "usb_binding"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_EXTRA_BINDINGS",
        path: &["session", "extra_bindings"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_ENV",
        path: &["session", "env"],
        var_type: EnvVarType::List,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_EXTRA_HOSTS",
        path: &["session", "extra_hosts"],
        var_type: EnvVarType::List,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_DISPLAY",
        path: &["session", "display"],
        var_type: EnvVarType::String,
    },
    EnvVarSpec {
        env_var: "RFSWIFT_SESSION_WORKING_DIR",
        path: &["session", "working_dir"],
        var_type: EnvVarType::String,
    },
];

/// Returns the environment variable names recognised by the config loader.
///
/// Tests use this to clear every `RFSWIFT_*` variable without keeping their
/// own list in sync.
#[must_use]
pub fn env_var_names() -> Vec<&'static str> {
    ENV_VAR_SPECS.iter().map(|spec| spec.env_var).collect()
}

/// Read a configuration file through `cap_std::fs_utf8` and push it to the
/// composer.
fn load_config_file(path: &Utf8PathBuf, composer: &mut MergeComposer) -> Result<()> {
    let current_dir = Utf8PathBuf::from(".");
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| current_dir.as_ref());
    let file_name = path.file_name().unwrap_or(path.as_str());

    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|e| {
        ConfigError::ParseError {
            message: format!("failed to open directory {parent}: {e}"),
        }
    })?;

    let content = dir
        .read_to_string(file_name)
        .map_err(|e| ConfigError::ParseError {
            message: format!("failed to read {path}: {e}"),
        })?;

    let value =
        toml::from_str::<serde_json::Value>(&content).map_err(|e| ConfigError::ParseError {
            message: format!("failed to parse {path}: {e}"),
        })?;

    composer.push_file(value, Some(path.clone()));
    Ok(())
}

/// Load configuration with full layer precedence from the process
/// environment.
///
/// # Errors
///
/// Returns `ConfigError` when:
/// - an explicit `--config` file does not exist
/// - a configuration file is malformed
/// - a typed environment value cannot be parsed
/// - the merged layers do not form a valid configuration
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
    load_config_with_env(cli, &DefaultEnv::new())
}

/// Load configuration reading environment variables through `env`.
///
/// # Errors
///
/// As [`load_config`].
pub fn load_config_with_env(cli: &Cli, env: &impl Env) -> Result<AppConfig> {
    let mut composer = MergeComposer::new();

    let defaults =
        serde_json::to_value(AppConfig::default()).map_err(|e| ConfigError::ParseError {
            message: format!("failed to serialise defaults: {e}"),
        })?;
    composer.push_defaults(defaults);

    if let Some(path) = config_path(cli)? {
        load_config_file(&path, &mut composer)?;
    }

    let env_values = collect_env_vars(env)?;
    if !env_values.is_null() {
        composer.push_environment(env_values);
    }

    let cli_overrides = build_cli_overrides(cli);
    if !cli_overrides.is_null() {
        composer.push_cli(cli_overrides);
    }

    let config =
        AppConfig::merge_from_layers(composer.layers()).map_err(ConfigError::OrthoConfig)?;

    Ok(config)
}

/// An explicit `--config` path must exist; otherwise discovery picks the
/// first existing candidate.
fn config_path(cli: &Cli) -> Result<Option<Utf8PathBuf>> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.clone().into_std_path_buf(),
            }
            .into());
        }
        return Ok(Some(path.clone()));
    }

    let discovery = ConfigDiscovery::builder("rfswift")
        .env_var("RFSWIFT_CONFIG_PATH")
        .config_file_name("config.toml")
        .dotfile_name(".rfswift.toml")
        .build();
    Ok(discovery
        .candidates()
        .into_iter()
        .filter(|p| p.exists())
        .find_map(|p| Utf8PathBuf::try_from(p).ok()))
}

/// Collect `RFSWIFT_*` environment variables into a JSON value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` when a boolean variable holds anything
/// other than `true` or `false`.
pub(super) fn collect_env_vars(env: &impl Env) -> Result<Value> {
    let mut root = Map::new();

    for spec in ENV_VAR_SPECS {
        let Some(raw_value) = env.string(spec.env_var) else {
            continue;
        };

        let json_value = match spec.var_type {
            EnvVarType::String => Value::String(raw_value),
            EnvVarType::Bool => match raw_value.trim().parse::<bool>() {
                Ok(b) => Value::Bool(b),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        field: spec.env_var.to_owned(),
                        reason: format!("expected bool (true/false), got '{raw_value}'"),
                    }
                    .into());
                }
            },
            EnvVarType::List => Value::Array(
                raw_value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_owned()))
                    .collect(),
            ),
        };

        insert_at_path(&mut root, spec.path, json_value);
    }

    if root.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Object(root))
    }
}

/// Insert a value at a nested path, creating intermediate objects.
fn insert_at_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((&field, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for &segment in parents {
        let entry = current
            .entry(segment.to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        let Some(obj) = entry.as_object_mut() else {
            return;
        };
        current = obj;
    }

    current.insert(field.to_owned(), value);
}

/// Build a JSON value containing CLI overrides.
pub(super) fn build_cli_overrides(cli: &Cli) -> Value {
    let mut overrides = Map::new();

    if let Some(engine) = cli.engine {
        overrides.insert(
            "engine".to_owned(),
            Value::String(engine.as_str().to_owned()),
        );
    }

    if let Some(ref image) = cli.image {
        overrides.insert("image".to_owned(), Value::String(image.clone()));
    }

    if overrides.is_empty() {
        Value::Null
    } else {
        Value::Object(overrides)
    }
}

