//! Engine client seams used by interactive sessions.
//!
//! Sessions only need a handful of container and exec endpoints. Wrapping them
//! behind traits with boxed futures keeps the lifecycle logic testable without
//! a live daemon; [`Docker`] implements both traits by delegation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use bollard::Docker;
use bollard::container::{AttachContainerResults, LogOutput};
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, CreateExecResults, ResizeExecOptions, StartExecOptions};
use bollard::models::{
    ContainerCreateBody, ContainerCreateResponse, ContainerInspectResponse, ContainerSummary,
    ExecInspectResponse,
};
use bollard::query_parameters::{
    AttachContainerOptionsBuilder, CreateContainerOptions, InspectContainerOptions,
    ListContainersOptionsBuilder, ResizeContainerTTYOptionsBuilder, StartContainerOptions,
    WaitContainerOptions,
};
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWrite;

/// Remote output of an attached container or exec process.
pub type OutputStream = Pin<Box<dyn Stream<Item = Result<LogOutput, BollardError>> + Send>>;

/// Remote input of an attached container or exec process.
pub type InputSink = Pin<Box<dyn AsyncWrite + Send>>;

/// Boxed future type returned by [`ContainerSessionClient::create_container`].
pub type CreateContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContainerCreateResponse, BollardError>> + Send + 'a>>;

/// Boxed future type for calls without a meaningful response body.
pub type UnitFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerSessionClient::inspect_container`].
pub type InspectContainerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ContainerInspectResponse, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerSessionClient::attach_container`].
pub type AttachFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AttachedStreams, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerSessionClient::wait_container`].
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = Result<i64, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerSessionClient::list_containers`].
pub type ListContainersFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<ContainerSummary>, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::create_exec`].
pub type CreateExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CreateExecResults, BollardError>> + Send + 'a>>;

/// Boxed future type returned by [`ContainerExecClient::start_exec`].
pub type StartExecFuture<'a> = Pin<
    Box<dyn Future<Output = Result<bollard::exec::StartExecResults, BollardError>> + Send + 'a>,
>;

/// Boxed future type returned by [`ContainerExecClient::inspect_exec`].
pub type InspectExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ExecInspectResponse, BollardError>> + Send + 'a>>;

/// Bidirectional streams of an attached process.
pub struct AttachedStreams {
    /// Remote stdout/stderr (multiplexed unless a TTY was allocated).
    pub output: OutputStream,
    /// Remote stdin.
    pub input: InputSink,
}

/// Container lifecycle calls used by `run` and `exec` sessions.
pub trait ContainerSessionClient {
    /// Create a container from `Bollard` options and body payload.
    fn create_container(
        &self,
        options: Option<CreateContainerOptions>,
        config: ContainerCreateBody,
    ) -> CreateContainerFuture<'_>;

    /// Start a created or stopped container.
    fn start_container(&self, container_id: &str) -> UnitFuture<'_>;

    /// Inspect a container by ID or name.
    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_>;

    /// Attach to the primary process's stdin, stdout, and stderr.
    fn attach_container(&self, container_id: &str) -> AttachFuture<'_>;

    /// Resize the container's pseudo-terminal.
    fn resize_container_tty(&self, container_id: &str, width: u16, height: u16)
    -> UnitFuture<'_>;

    /// Wait for the primary process to exit, yielding its exit code.
    fn wait_container(&self, container_id: &str) -> WaitFuture<'_>;

    /// List all containers, running or not, matching `label` (`key=value`).
    fn list_containers(&self, label: &str) -> ListContainersFuture<'_>;
}

/// Behaviour required to run and inspect exec sessions.
pub trait ContainerExecClient {
    /// Create an exec session in a running container.
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_>;

    /// Start a previously created exec session.
    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_>;

    /// Inspect an exec session for running status and exit code.
    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_>;

    /// Resize a running exec pseudo-terminal.
    fn resize_exec(&self, exec_id: &str, options: ResizeExecOptions) -> UnitFuture<'_>;
}

impl ContainerSessionClient for Docker {
    fn create_container(
        &self,
        options: Option<CreateContainerOptions>,
        config: ContainerCreateBody,
    ) -> CreateContainerFuture<'_> {
        Box::pin(async move { Self::create_container(self, options, config).await })
    }

    fn start_container(&self, container_id: &str) -> UnitFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::start_container(self, &container_id_owned, None::<StartContainerOptions>).await
        })
    }

    fn inspect_container(&self, container_id: &str) -> InspectContainerFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            Self::inspect_container(self, &container_id_owned, None::<InspectContainerOptions>)
                .await
        })
    }

    fn attach_container(&self, container_id: &str) -> AttachFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let options = AttachContainerOptionsBuilder::new()
                .stdin(true)
                .stdout(true)
                .stderr(true)
                .stream(true)
                .logs(false)
                .build();
            let AttachContainerResults { output, input } =
                Self::attach_container(self, &container_id_owned, Some(options)).await?;
            Ok(AttachedStreams { output, input })
        })
    }

    fn resize_container_tty(
        &self,
        container_id: &str,
        width: u16,
        height: u16,
    ) -> UnitFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let options = ResizeContainerTTYOptionsBuilder::new()
                .w(i32::from(width))
                .h(i32::from(height))
                .build();
            Self::resize_container_tty(self, &container_id_owned, options).await
        })
    }

    fn wait_container(&self, container_id: &str) -> WaitFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move {
            let mut responses =
                Self::wait_container(self, &container_id_owned, None::<WaitContainerOptions>);
            match responses.next().await {
                Some(Ok(response)) => Ok(response.status_code),
                // Bollard reports a non-zero exit status as an error.
                Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
                Some(Err(error)) => Err(error),
                None => Ok(0),
            }
        })
    }

    fn list_containers(&self, label: &str) -> ListContainersFuture<'_> {
        let filters = HashMap::from([(String::from("label"), vec![String::from(label)])]);
        Box::pin(async move {
            let options = ListContainersOptionsBuilder::new()
                .all(true)
                .filters(&filters)
                .build();
            Self::list_containers(self, Some(options)).await
        })
    }
}

impl ContainerExecClient for Docker {
    fn create_exec(
        &self,
        container_id: &str,
        options: CreateExecOptions<String>,
    ) -> CreateExecFuture<'_> {
        let container_id_owned = String::from(container_id);
        Box::pin(async move { Self::create_exec(self, &container_id_owned, options).await })
    }

    fn start_exec(&self, exec_id: &str, options: Option<StartExecOptions>) -> StartExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::start_exec(self, &exec_id_owned, options).await })
    }

    fn inspect_exec(&self, exec_id: &str) -> InspectExecFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::inspect_exec(self, &exec_id_owned).await })
    }

    fn resize_exec(&self, exec_id: &str, options: ResizeExecOptions) -> UnitFuture<'_> {
        let exec_id_owned = String::from(exec_id);
        Box::pin(async move { Self::resize_exec(self, &exec_id_owned, options).await })
    }
}

/// Whether `error` is the engine's 404 response.
pub(crate) const fn is_not_found(error: &BollardError) -> bool {
    matches!(
        error,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}
