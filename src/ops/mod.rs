//! One-shot, non-interactive engine operations.
//!
//! Commit, pull, tag, rename, and removal each issue a single request (or a
//! short sequence for image removal) and report success or a descriptive
//! error. No session state is involved; callers open a client per operation.

mod reference;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::errors::Error as BollardError;
use bollard::models::{ContainerConfig, CreateImageInfo, ImageSummary};
use bollard::query_parameters::{
    CommitContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
    ListImagesOptionsBuilder, RemoveContainerOptionsBuilder, RemoveImageOptionsBuilder,
    RenameContainerOptionsBuilder, TagImageOptionsBuilder,
};
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

pub use reference::{DEFAULT_TAG, ImageReference};

use crate::error::{ContainerError, RfswiftError};
use crate::session::{ContainerSessionClient, UnitFuture, is_not_found, list_session_containers};

/// Label filter matching published rfswift images.
pub const IMAGE_LABEL_FILTER: &str = "org.container.project=rfswift";

/// Progress stream returned by [`EngineOpsClient::pull_image`].
pub type PullStream<'a> =
    Pin<Box<dyn Stream<Item = Result<CreateImageInfo, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`EngineOpsClient::list_images`].
pub type ListImagesFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ImageSummary>, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`EngineOpsClient::containers_from_image`].
pub type ContainerIdsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<String>, BollardError>> + Send + 'a>>;

/// Engine calls used by one-shot operations.
pub trait EngineOpsClient {
    /// Snapshot `container` into `repository:tag`.
    fn commit_container(&self, container: &str, target: &ImageReference) -> UnitFuture<'_>;

    /// Pull `reference`, yielding progress records.
    fn pull_image(&self, reference: &ImageReference) -> PullStream<'_>;

    /// Add `target` as a name for `source`.
    fn tag_image(&self, source: &str, target: &ImageReference) -> UnitFuture<'_>;

    /// Rename a container.
    fn rename_container(&self, container: &str, new_name: &str) -> UnitFuture<'_>;

    /// Remove a container, stopping it if needed.
    fn remove_container(&self, container: &str) -> UnitFuture<'_>;

    /// Remove an image by name or ID.
    fn remove_image(&self, image: &str) -> UnitFuture<'_>;

    /// List images, optionally restricted to a `key=value` label.
    fn list_images(&self, label: Option<String>) -> ListImagesFuture<'_>;

    /// IDs of all containers created from `image`.
    fn containers_from_image(&self, image: &str) -> ContainerIdsFuture<'_>;
}

impl EngineOpsClient for Docker {
    fn commit_container(&self, container: &str, target: &ImageReference) -> UnitFuture<'_> {
        let options = CommitContainerOptionsBuilder::new()
            .container(container)
            .repo(target.repository())
            .tag(target.tag())
            .build();
        Box::pin(async move {
            Self::commit_container(self, options, ContainerConfig::default()).await?;
            Ok(())
        })
    }

    fn pull_image(&self, reference: &ImageReference) -> PullStream<'_> {
        let options = CreateImageOptionsBuilder::new()
            .from_image(reference.repository())
            .tag(reference.tag())
            .build();
        Box::pin(Self::create_image(self, Some(options), None, None))
    }

    fn tag_image(&self, source: &str, target: &ImageReference) -> UnitFuture<'_> {
        let source_owned = String::from(source);
        let options = TagImageOptionsBuilder::new()
            .repo(target.repository())
            .tag(target.tag())
            .build();
        Box::pin(async move { Self::tag_image(self, &source_owned, Some(options)).await })
    }

    fn rename_container(&self, container: &str, new_name: &str) -> UnitFuture<'_> {
        let container_owned = String::from(container);
        let options = RenameContainerOptionsBuilder::new().name(new_name).build();
        Box::pin(async move { Self::rename_container(self, &container_owned, options).await })
    }

    fn remove_container(&self, container: &str) -> UnitFuture<'_> {
        let container_owned = String::from(container);
        let options = RemoveContainerOptionsBuilder::new().force(true).build();
        Box::pin(async move {
            Self::remove_container(self, &container_owned, Some(options)).await
        })
    }

    fn remove_image(&self, image: &str) -> UnitFuture<'_> {
        let image_owned = String::from(image);
        let options = RemoveImageOptionsBuilder::new().force(true).build();
        Box::pin(async move {
            Self::remove_image(self, &image_owned, Some(options), None).await?;
            Ok(())
        })
    }

    fn list_images(&self, label: Option<String>) -> ListImagesFuture<'_> {
        let filters: HashMap<String, Vec<String>> = label
            .map(|value| HashMap::from([(String::from("label"), vec![value])]))
            .unwrap_or_default();
        Box::pin(async move {
            let options = ListImagesOptionsBuilder::new()
                .all(false)
                .filters(&filters)
                .build();
            Self::list_images(self, Some(options)).await
        })
    }

    fn containers_from_image(&self, image: &str) -> ContainerIdsFuture<'_> {
        let filters = HashMap::from([(String::from("ancestor"), vec![String::from(image)])]);
        Box::pin(async move {
            let options = ListContainersOptionsBuilder::new()
                .all(true)
                .filters(&filters)
                .build();
            let summaries = Self::list_containers(self, Some(options)).await?;
            Ok(summaries
                .into_iter()
                .filter_map(|summary| summary.id)
                .collect())
        })
    }
}

/// A local image as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Image ID.
    pub id: String,
    /// `repository:tag` names pointing at the image.
    pub tags: Vec<String>,
    /// Creation time in seconds since the Unix epoch.
    pub created: i64,
    /// Size in bytes.
    pub size: i64,
}

impl From<ImageSummary> for ImageEntry {
    fn from(summary: ImageSummary) -> Self {
        Self {
            id: summary.id,
            tags: summary.repo_tags,
            created: summary.created,
            size: summary.size,
        }
    }
}

/// What [`remove_image`] removed along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRemoval {
    /// Dependent containers that were removed.
    pub removed_containers: Vec<String>,
    /// Dependent containers whose removal failed.
    pub failed_containers: Vec<String>,
}

/// Commit `container` as `target`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` (listing labelled containers) when the
/// container does not exist, and `ContainerError::OperationFailed` for any
/// other engine error.
pub async fn commit_container<C>(
    client: &C,
    container: &str,
    target: &ImageReference,
) -> Result<(), RfswiftError>
where
    C: EngineOpsClient + ContainerSessionClient + Sync,
{
    if let Err(error) = client.commit_container(container, target).await {
        return Err(container_failure(client, "commit", container, &error).await);
    }
    info!(container, image = %target, "container committed");
    Ok(())
}

/// Pull `reference`, logging progress at debug level.
///
/// # Errors
///
/// Returns `ContainerError::OperationFailed` with the engine message when any
/// progress record reports an error.
pub async fn pull_image<C: EngineOpsClient + ?Sized>(
    client: &C,
    reference: &ImageReference,
) -> Result<(), RfswiftError> {
    let mut progress = client.pull_image(reference);
    while let Some(record) = progress.next().await {
        let update =
            record.map_err(|error| operation_failed("pull", &reference.to_string(), &error))?;
        debug!(
            image = %reference,
            status = update.status.as_deref().unwrap_or_default(),
            progress = ?update.progress_detail,
            "pull progress"
        );
    }
    info!(image = %reference, "image pulled");
    Ok(())
}

/// Tag `source` as `target`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` (listing local images) when `source`
/// does not exist, and `ContainerError::OperationFailed` otherwise.
pub async fn tag_image<C: EngineOpsClient + Sync + ?Sized>(
    client: &C,
    source: &str,
    target: &ImageReference,
) -> Result<(), RfswiftError> {
    if let Err(error) = client.tag_image(source, target).await {
        return Err(image_failure(client, "tag", source, &error).await);
    }
    info!(source, target = %target, "image tagged");
    Ok(())
}

/// Rename `container` to `new_name`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` or `ContainerError::OperationFailed`.
pub async fn rename_container<C>(
    client: &C,
    container: &str,
    new_name: &str,
) -> Result<(), RfswiftError>
where
    C: EngineOpsClient + ContainerSessionClient + Sync,
{
    if let Err(error) = client.rename_container(container, new_name).await {
        return Err(container_failure(client, "rename", container, &error).await);
    }
    info!(container, new_name, "container renamed");
    Ok(())
}

/// Force-remove `container`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` or `ContainerError::OperationFailed`.
pub async fn remove_container<C>(client: &C, container: &str) -> Result<(), RfswiftError>
where
    C: EngineOpsClient + ContainerSessionClient + Sync,
{
    if let Err(error) = client.remove_container(container).await {
        return Err(container_failure(client, "remove", container, &error).await);
    }
    info!(container, "container removed");
    Ok(())
}

/// Remove `image` after removing every container created from it.
///
/// A dependent that cannot be removed is logged and recorded; it does not
/// abort the removal.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` (listing local images) when the image
/// does not exist, and `ContainerError::OperationFailed` when listing
/// dependents or removing the image fails.
pub async fn remove_image<C: EngineOpsClient + Sync + ?Sized>(
    client: &C,
    image: &str,
) -> Result<ImageRemoval, RfswiftError> {
    let dependents = client
        .containers_from_image(image)
        .await
        .map_err(|error| operation_failed("list dependents of", image, &error))?;

    let mut removal = ImageRemoval::default();
    for container in dependents {
        match client.remove_container(&container).await {
            Ok(()) => {
                debug!(container = %container, image, "removed dependent container");
                removal.removed_containers.push(container);
            }
            Err(error) => {
                warn!(container = %container, image, %error, "could not remove dependent container");
                removal.failed_containers.push(container);
            }
        }
    }

    if let Err(error) = client.remove_image(image).await {
        return Err(image_failure(client, "remove image", image, &error).await);
    }
    info!(image, removed = removal.removed_containers.len(), "image removed");
    Ok(removal)
}

/// List local images, optionally restricted to a `key=value` label.
///
/// # Errors
///
/// Returns `ContainerError::OperationFailed` when the engine rejects the
/// listing.
pub async fn list_images<C: EngineOpsClient + ?Sized>(
    client: &C,
    label: Option<&str>,
) -> Result<Vec<ImageEntry>, RfswiftError> {
    let summaries = client
        .list_images(label.map(String::from))
        .await
        .map_err(|error| operation_failed("list images", label.unwrap_or("all"), &error))?;
    let mut images: Vec<ImageEntry> = summaries.into_iter().map(ImageEntry::from).collect();
    images.sort_by(|left, right| right.created.cmp(&left.created));
    Ok(images)
}

/// Maps a failed container operation, listing labelled containers on a miss.
async fn container_failure<C: ContainerSessionClient + Sync + ?Sized>(
    client: &C,
    operation: &str,
    container: &str,
    error: &BollardError,
) -> RfswiftError {
    if !is_not_found(error) {
        return operation_failed(operation, container, error);
    }
    let available = list_session_containers(client)
        .await
        .map(|containers| containers.into_iter().map(|found| found.name).collect())
        .unwrap_or_default();
    not_found(container, available)
}

/// Maps a failed image operation, listing local image names on a miss.
async fn image_failure<C: EngineOpsClient + Sync + ?Sized>(
    client: &C,
    operation: &str,
    image: &str,
    error: &BollardError,
) -> RfswiftError {
    if !is_not_found(error) {
        return operation_failed(operation, image, error);
    }
    let available = client
        .list_images(None)
        .await
        .map(|summaries| {
            summaries
                .into_iter()
                .flat_map(|summary| summary.repo_tags)
                .collect()
        })
        .unwrap_or_default();
    not_found(image, available)
}

fn not_found(identifier: &str, available: Vec<String>) -> RfswiftError {
    RfswiftError::from(ContainerError::NotFound {
        identifier: String::from(identifier),
        available,
    })
}

fn operation_failed(operation: &str, target: &str, error: &BollardError) -> RfswiftError {
    RfswiftError::from(ContainerError::OperationFailed {
        operation: String::from(operation),
        target: String::from(target),
        message: error.to_string(),
    })
}
