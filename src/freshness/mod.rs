//! Image freshness: is a local image behind its published tag?
//!
//! The remote listing is filtered to the host architecture and reduced to
//! the most recent push per tag name. A tag missing from that listing marks
//! the image as locally built ([`ImageStatus::Custom`]); otherwise the local
//! creation time is compared with the remote push time less
//! [`CLOCK_SKEW_TOLERANCE`].

mod registry;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

pub use registry::{DOCKER_HUB_API, DockerHubTagSource};

use crate::error::{ImageError, RfswiftError};

/// Slack subtracted from the remote push time before comparing.
pub const CLOCK_SKEW_TOLERANCE: TimeDelta = TimeDelta::hours(2);

/// Freshness of a local image relative to its published tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// The local image is at least as new as the published one.
    UpToDate,
    /// A newer image has been published under the same tag.
    Obsolete,
    /// The tag is not published for this architecture.
    Custom,
    /// The status could not be determined.
    Unknown(String),
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => formatter.write_str("up-to-date"),
            Self::Obsolete => formatter.write_str("obsolete"),
            Self::Custom => formatter.write_str("custom"),
            Self::Unknown(reason) => write!(formatter, "unknown ({reason})"),
        }
    }
}

/// One architecture-specific entry of a remote tag listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTag {
    /// Tag name.
    pub name: String,
    /// Registry architecture name (`amd64`, `arm64`, ...).
    pub architecture: String,
    /// When this entry was pushed.
    pub pushed: DateTime<Utc>,
}

/// Boxed future type returned by [`TagSource::list_tags`].
pub type TagsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<RemoteTag>, RfswiftError>> + Send + 'a>>;

/// Boxed future type returned by [`LocalImageSource::image_created`].
pub type CreatedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<DateTime<Utc>, RfswiftError>> + Send + 'a>>;

/// Remote tag metadata for a repository.
pub trait TagSource {
    /// Every tag of `repository` published for `architecture`.
    fn list_tags(&self, repository: &str, architecture: &str) -> TagsFuture<'_>;
}

/// Creation times of local images.
pub trait LocalImageSource {
    /// When the local image `image` was created.
    fn image_created(&self, image: &str) -> CreatedFuture<'_>;
}

impl LocalImageSource for Docker {
    fn image_created(&self, image: &str) -> CreatedFuture<'_> {
        let image_owned = String::from(image);
        Box::pin(async move {
            let inspect = Self::inspect_image(self, &image_owned)
                .await
                .map_err(|error| {
                    RfswiftError::from(ImageError::InspectFailed {
                        image: image_owned.clone(),
                        message: error.to_string(),
                    })
                })?;
            let raw = inspect.created.ok_or_else(|| {
                RfswiftError::from(ImageError::InspectFailed {
                    image: image_owned.clone(),
                    message: String::from("image has no creation time"),
                })
            })?;
            parse_timestamp(&raw)
        })
    }
}

/// Registry architecture name for a host CPU architecture.
///
/// # Errors
///
/// Returns `ImageError::UnsupportedArchitecture` for anything without a
/// published image variant.
pub fn registry_architecture(host_arch: &str) -> Result<&'static str, RfswiftError> {
    match host_arch {
        "x86_64" | "amd64" => Ok("amd64"),
        "aarch64" | "arm64" => Ok("arm64"),
        "riscv64" => Ok("riscv64"),
        "arm" => Ok("arm"),
        other => Err(RfswiftError::from(ImageError::UnsupportedArchitecture {
            arch: String::from(other),
        })),
    }
}

/// Docker Hub's name for a local repository.
///
/// Podman stores Hub images fully qualified (`docker.io/penthertz/rfswift`);
/// the Hub API wants the bare `namespace/name`, with official images under
/// `library/`.
#[must_use]
pub fn hub_repository(repository: &str) -> String {
    let bare = ["docker.io/", "index.docker.io/"]
        .into_iter()
        .find_map(|registry| repository.strip_prefix(registry))
        .unwrap_or(repository);
    if bare.contains('/') {
        String::from(bare)
    } else {
        format!("library/{bare}")
    }
}

/// Reduce a listing to the most recently pushed entry per tag name.
#[must_use]
pub fn latest_per_name(tags: Vec<RemoteTag>) -> HashMap<String, RemoteTag> {
    let mut latest: HashMap<String, RemoteTag> = HashMap::new();
    for tag in tags {
        let newer = latest
            .get(&tag.name)
            .is_none_or(|existing| tag.pushed > existing.pushed);
        if newer {
            latest.insert(tag.name.clone(), tag);
        }
    }
    latest
}

/// Classify a local image against the remote entry for its tag.
#[must_use]
pub fn classify(local_created: DateTime<Utc>, remote: Option<&RemoteTag>) -> ImageStatus {
    let Some(published) = remote else {
        return ImageStatus::Custom;
    };

    if local_created < published.pushed - CLOCK_SKEW_TOLERANCE {
        ImageStatus::Obsolete
    } else {
        ImageStatus::UpToDate
    }
}

/// Compares local images with their published tags.
pub struct FreshnessChecker<T, L> {
    tags: T,
    local: L,
    architecture: &'static str,
}

impl<T: TagSource, L: LocalImageSource> FreshnessChecker<T, L> {
    /// A checker for the host's architecture.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::UnsupportedArchitecture` when the host has no
    /// published image variant.
    pub fn new(tags: T, local: L) -> Result<Self, RfswiftError> {
        Self::for_architecture(tags, local, std::env::consts::ARCH)
    }

    /// A checker for an explicit host architecture.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::UnsupportedArchitecture` for unknown
    /// architectures.
    pub fn for_architecture(tags: T, local: L, host_arch: &str) -> Result<Self, RfswiftError> {
        Ok(Self {
            tags,
            local,
            architecture: registry_architecture(host_arch)?,
        })
    }

    /// Freshness of the local `repository:tag` image.
    ///
    /// # Errors
    ///
    /// Returns registry, inspect, and timestamp errors.
    pub async fn status(&self, repository: &str, tag: &str) -> Result<ImageStatus, RfswiftError> {
        let listing = self
            .tags
            .list_tags(&hub_repository(repository), self.architecture)
            .await?;
        let latest = latest_per_name(listing);
        let Some(remote) = latest.get(tag) else {
            debug!(repository, tag, "tag not published; treating as custom");
            return Ok(ImageStatus::Custom);
        };

        let local_created = self
            .local
            .image_created(&format!("{repository}:{tag}"))
            .await?;
        let status = classify(local_created, Some(remote));
        debug!(repository, tag, %local_created, pushed = %remote.pushed, %status, "classified image");
        Ok(status)
    }

    /// Like [`Self::status`], reporting failures as [`ImageStatus::Unknown`].
    pub async fn status_or_unknown(&self, repository: &str, tag: &str) -> ImageStatus {
        self.status(repository, tag)
            .await
            .unwrap_or_else(|error| ImageStatus::Unknown(error.to_string()))
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RfswiftError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            RfswiftError::from(ImageError::InvalidTimestamp {
                value: String::from(raw),
                message: error.to_string(),
            })
        })
}

#[cfg(test)]
mod tests;
