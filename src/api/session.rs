//! Interactive `run` and `exec` orchestration.
//!
//! Terminal state and resize events are taken from the real process; the
//! session layer restores the terminal on every exit path.

use tracing::debug;

use crate::error::Result as RfswiftResult;
use crate::session::{SessionConfig, SessionContext, exec_session_async, run_session_async};

use super::{CommandOutcome, EngineContext};

/// Create a container from `session` and attach to it.
///
/// # Errors
///
/// Returns engine connection errors, and `ContainerError::CreateFailed`,
/// `StartFailed`, `AttachFailed`, or `WaitFailed` from the session
/// lifecycle.
pub fn run_container(
    context: &EngineContext<'_>,
    session: &SessionConfig,
) -> RfswiftResult<CommandOutcome> {
    let docker = context.client()?;
    debug!(image = session.image(), "starting run session");

    let outcome = context.runtime_handle.block_on(async {
        let mut session_context = SessionContext::system()?;
        run_session_async(&docker, session, &mut session_context).await
    })?;

    Ok(CommandOutcome::from(&outcome))
}

/// Open `shell` in `container`, or in the most recent rfswift container when
/// no identifier is given.
///
/// # Errors
///
/// Returns `ContainerError::NotFound` (non-fatal, listing the labelled
/// containers) when no target exists, and `ContainerError::ExecFailed` or
/// `StartFailed` from the session lifecycle.
pub fn exec_container(
    context: &EngineContext<'_>,
    container: Option<&str>,
    shell: &str,
) -> RfswiftResult<CommandOutcome> {
    let docker = context.client()?;
    debug!(container = container.unwrap_or("latest"), shell, "starting exec session");

    let outcome = context.runtime_handle.block_on(async {
        let mut session_context = SessionContext::system()?;
        exec_session_async(&docker, container, shell, &mut session_context).await
    })?;

    Ok(CommandOutcome::from(&outcome))
}
