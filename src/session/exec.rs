//! Interactive `exec`: open a shell in an existing container.

use std::time::Duration;

use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use tokio::time::sleep;
use tracing::{debug, info};

use super::SessionOutcome;
use super::bridge::{ExitFuture, SessionContext, bridge};
use super::client::{AttachedStreams, ContainerExecClient, ContainerSessionClient, is_not_found};
use super::lookup::{latest_session_container, list_session_containers};
use super::resize::ExecTty;
use crate::error::{ConfigError, ContainerError, RfswiftError};

const EXEC_INSPECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Open `shell` (split on whitespace) in a container and bridge the local
/// terminal to it.
///
/// With no `identifier` (or a blank one) the most recently created
/// labelled container is used. A stopped container is started first.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` when no container matches,
/// `ConfigError::MissingRequired` for an empty shell, and
/// `ContainerError::ExecFailed` when the exec cannot be created or started.
pub async fn exec_session_async<C>(
    client: &C,
    identifier: Option<&str>,
    shell: &str,
    context: &mut SessionContext,
) -> Result<SessionOutcome, RfswiftError>
where
    C: ContainerSessionClient + ContainerExecClient + Sync,
{
    let command: Vec<String> = shell.split_whitespace().map(String::from).collect();
    if command.is_empty() {
        return Err(RfswiftError::from(ConfigError::MissingRequired {
            field: String::from("shell"),
        }));
    }

    let container_id = resolve_running_container(client, identifier).await?;

    let tty = context.is_interactive();
    let exec_id = client
        .create_exec(
            &container_id,
            CreateExecOptions::<String> {
                attach_stdin: Some(true),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                tty: Some(tty),
                cmd: Some(command),
                ..CreateExecOptions::default()
            },
        )
        .await
        .map_err(|error| exec_failed(&container_id, format!("create exec failed: {error}")))?
        .id;

    let started = client
        .start_exec(
            &exec_id,
            Some(StartExecOptions {
                detach: false,
                tty,
                output_capacity: None,
            }),
        )
        .await
        .map_err(|error| exec_failed(&container_id, format!("start exec failed: {error}")))?;
    let StartExecResults::Attached { output, input } = started else {
        return Err(exec_failed(
            &container_id,
            "daemon returned detached start result for attached mode",
        ));
    };
    info!(container_id = %container_id, exec_id = %exec_id, "exec session attached");

    let resizer = ExecTty {
        client,
        exec_id: &exec_id,
    };
    let exit: ExitFuture<'_> = Box::pin(wait_for_exec_exit(client, &container_id, &exec_id));
    let end = bridge(
        &container_id,
        AttachedStreams { output, input },
        context,
        &resizer,
        exit,
    )
    .await?;

    Ok(SessionOutcome { container_id, end })
}

/// Resolves the target to an ID and starts it when stopped.
async fn resolve_running_container<C: ContainerSessionClient>(
    client: &C,
    identifier: Option<&str>,
) -> Result<String, RfswiftError> {
    let requested = match identifier.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => String::from(value),
        None => {
            let latest = latest_session_container(client).await?;
            debug!(container_id = %latest.id, name = %latest.name, "using latest container");
            latest.id
        }
    };

    let inspect = match client.inspect_container(&requested).await {
        Ok(response) => response,
        Err(error) if is_not_found(&error) => {
            let available = list_session_containers(client)
                .await?
                .into_iter()
                .map(|container| container.name)
                .collect();
            return Err(RfswiftError::from(ContainerError::NotFound {
                identifier: requested,
                available,
            }));
        }
        Err(error) => {
            return Err(exec_failed(
                &requested,
                format!("inspect container failed: {error}"),
            ));
        }
    };

    let running = inspect
        .state
        .and_then(|state| state.running)
        .unwrap_or(false);
    let container_id = inspect.id.unwrap_or(requested);
    if running {
        return Ok(container_id);
    }

    info!(container_id = %container_id, "starting stopped container");
    client.start_container(&container_id).await.map_err(|error| {
        RfswiftError::from(ContainerError::StartFailed {
            container_id: container_id.clone(),
            message: error.to_string(),
        })
    })?;
    Ok(container_id)
}

async fn wait_for_exec_exit<C: ContainerExecClient>(
    client: &C,
    container_id: &str,
    exec_id: &str,
) -> Result<i64, RfswiftError> {
    loop {
        let inspect = client
            .inspect_exec(exec_id)
            .await
            .map_err(|error| exec_failed(container_id, format!("inspect exec failed: {error}")))?;

        if inspect.running.unwrap_or(false) {
            sleep(EXEC_INSPECT_POLL_INTERVAL).await;
            continue;
        }

        return inspect.exit_code.ok_or_else(|| {
            exec_failed(
                container_id,
                format!("exec session '{exec_id}' completed without an exit code"),
            )
        });
    }
}

fn exec_failed(container_id: &str, message: impl Into<String>) -> RfswiftError {
    RfswiftError::from(ContainerError::ExecFailed {
        container_id: String::from(container_id),
        message: message.into(),
    })
}
