//! Non-interactive container and image commands.

use tracing::{debug, warn};

use crate::error::Result as RfswiftResult;
use crate::freshness::{DockerHubTagSource, FreshnessChecker, ImageStatus};
use crate::ops::{self, IMAGE_LABEL_FILTER, ImageReference, ImageRemoval};

use super::{CommandOutcome, EngineContext};

/// Freshness of one local image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStatusReport {
    /// The image checked.
    pub reference: ImageReference,
    /// Its classification.
    pub status: ImageStatus,
}

/// Save `container` as the image `target`.
///
/// # Errors
///
/// Returns `ImageError::InvalidReference` for a malformed target, and
/// `ContainerError::NotFound` or `OperationFailed` from the engine.
pub fn commit_container(
    context: &EngineContext<'_>,
    container: &str,
    target: &str,
) -> RfswiftResult<CommandOutcome> {
    let reference: ImageReference = target.parse()?;
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::commit_container(&docker, container, &reference))?;
    Ok(CommandOutcome::Success)
}

/// Pull `reference`.
///
/// # Errors
///
/// Returns `ImageError::InvalidReference` or `ContainerError::OperationFailed`.
pub fn pull_image(context: &EngineContext<'_>, reference: &str) -> RfswiftResult<CommandOutcome> {
    let parsed: ImageReference = reference.parse()?;
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::pull_image(&docker, &parsed))?;
    Ok(CommandOutcome::Success)
}

/// Tag `source` as `target`.
///
/// # Errors
///
/// Returns `ImageError::InvalidReference`, `ContainerError::NotFound`, or
/// `ContainerError::OperationFailed`.
pub fn tag_image(
    context: &EngineContext<'_>,
    source: &str,
    target: &str,
) -> RfswiftResult<CommandOutcome> {
    let reference: ImageReference = target.parse()?;
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::tag_image(&docker, source, &reference))?;
    Ok(CommandOutcome::Success)
}

/// Rename `container` to `new_name`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` or `ContainerError::OperationFailed`.
pub fn rename_container(
    context: &EngineContext<'_>,
    container: &str,
    new_name: &str,
) -> RfswiftResult<CommandOutcome> {
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::rename_container(&docker, container, new_name))?;
    Ok(CommandOutcome::Success)
}

/// Force-remove `container`.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` or `ContainerError::OperationFailed`.
pub fn remove_container(
    context: &EngineContext<'_>,
    container: &str,
) -> RfswiftResult<CommandOutcome> {
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::remove_container(&docker, container))?;
    Ok(CommandOutcome::Success)
}

/// Remove `image` and the containers created from it.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` or `ContainerError::OperationFailed`.
pub fn remove_image(context: &EngineContext<'_>, image: &str) -> RfswiftResult<ImageRemoval> {
    let docker = context.client()?;
    context
        .runtime_handle
        .block_on(ops::remove_image(&docker, image))
}

/// Check `reference`, or every labelled local image, against Docker Hub.
///
/// Registry and inspect failures are reported per image as
/// [`ImageStatus::Unknown`].
///
/// # Errors
///
/// Returns `ImageError::InvalidReference` for a malformed reference,
/// `ImageError::UnsupportedArchitecture` on hosts without published images,
/// and engine errors when listing local images fails.
pub fn image_status(
    context: &EngineContext<'_>,
    reference: Option<&str>,
) -> RfswiftResult<Vec<ImageStatusReport>> {
    let explicit = reference
        .map(str::parse::<ImageReference>)
        .transpose()?;
    let docker = context.client()?;
    let tags = DockerHubTagSource::new()?;

    context.runtime_handle.block_on(async {
        let references = match explicit {
            Some(parsed) => vec![parsed],
            None => labelled_references(&docker).await?,
        };
        let checker = FreshnessChecker::new(tags, docker)?;

        let mut reports = Vec::with_capacity(references.len());
        for image in references {
            let status = checker
                .status_or_unknown(image.repository(), image.tag())
                .await;
            debug!(image = %image, %status, "image status");
            reports.push(ImageStatusReport {
                reference: image,
                status,
            });
        }
        Ok(reports)
    })
}

async fn labelled_references(docker: &bollard::Docker) -> RfswiftResult<Vec<ImageReference>> {
    let images = ops::list_images(docker, Some(IMAGE_LABEL_FILTER)).await?;
    Ok(images
        .into_iter()
        .flat_map(|image| image.tags)
        .filter(|tag| !tag.starts_with("<none>"))
        .filter_map(|tag| match tag.parse::<ImageReference>() {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn!(tag = %tag, %error, "skipping unparseable image name");
                None
            }
        })
        .collect())
}
