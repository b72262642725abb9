//! Interactive `run`: create, start, attach, and bridge a new container.

use tracing::info;

use super::SessionOutcome;
use super::bridge::{ExitFuture, SessionContext, bridge};
use super::client::ContainerSessionClient;
use super::config::{SessionConfig, build_create_body, build_create_options};
use super::resize::ContainerTty;
use crate::error::{ContainerError, RfswiftError};

/// Create a container from `config` and bridge the local terminal to it
/// until its primary process exits.
///
/// A container that fails to start is left in place for the caller to
/// remove.
///
/// # Errors
///
/// Returns `ContainerError::CreateFailed`, `StartFailed`, or `AttachFailed`
/// for the corresponding lifecycle step, and the bridge errors of the
/// session itself.
pub async fn run_session_async<C: ContainerSessionClient + Sync>(
    client: &C,
    config: &SessionConfig,
    context: &mut SessionContext,
) -> Result<SessionOutcome, RfswiftError> {
    let tty = context.is_interactive();
    let response = client
        .create_container(
            build_create_options(config),
            build_create_body(config, tty),
        )
        .await
        .map_err(|error| {
            RfswiftError::from(ContainerError::CreateFailed {
                message: error.to_string(),
            })
        })?;
    let container_id = response.id;
    info!(container_id = %container_id, image = config.image(), "container created");

    client
        .start_container(&container_id)
        .await
        .map_err(|error| {
            RfswiftError::from(ContainerError::StartFailed {
                container_id: container_id.clone(),
                message: error.to_string(),
            })
        })?;
    info!(container_id = %container_id, "container started");

    let streams = client
        .attach_container(&container_id)
        .await
        .map_err(|error| {
            RfswiftError::from(ContainerError::AttachFailed {
                container_id: container_id.clone(),
                message: error.to_string(),
            })
        })?;

    let resizer = ContainerTty {
        client,
        container_id: &container_id,
    };
    let exit: ExitFuture<'_> = Box::pin(wait_for_container_exit(client, &container_id));
    let end = bridge(&container_id, streams, context, &resizer, exit).await?;

    Ok(SessionOutcome { container_id, end })
}

async fn wait_for_container_exit<C: ContainerSessionClient>(
    client: &C,
    container_id: &str,
) -> Result<i64, RfswiftError> {
    client.wait_container(container_id).await.map_err(|error| {
        RfswiftError::from(ContainerError::WaitFailed {
            container_id: String::from(container_id),
            message: error.to_string(),
        })
    })
}
