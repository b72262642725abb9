//! Engine identity and preference values.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A container engine backend, or the request to pick one automatically.
///
/// `Auto` only ever appears as a preference. A resolved engine always reports
/// `Docker` or `Podman`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Docker Engine or Docker Desktop.
    Docker,
    /// Podman, rootless or rootful.
    Podman,
    /// Prefer Docker, fall back to Podman.
    #[default]
    Auto,
}

impl EngineKind {
    /// Returns the lowercase name used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
            Self::Auto => "auto",
        }
    }

    /// Returns the other concrete backend, or `None` for `Auto`.
    #[must_use]
    pub const fn alternative(self) -> Option<Self> {
        match self {
            Self::Docker => Some(Self::Podman),
            Self::Podman => Some(Self::Docker),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            "auto" | "" => Ok(Self::Auto),
            other => Err(ConfigError::InvalidValue {
                field: String::from("engine"),
                reason: format!("expected docker, podman or auto, got '{other}'"),
            }),
        }
    }
}
