//! Orchestration API for rfswift commands.
//!
//! Each command resolves the container engine through an [`EngineSelector`],
//! opens a short-lived client, and drives the session, operation, or
//! freshness layers. The CLI and library embedders share these entry points.
//!
//! All functions accept library-owned types (not clap types). They do not
//! print to stdout/stderr or call `std::process::exit`.

mod engine;
mod images;
mod session;

use bollard::Docker;
use tokio::runtime::Handle;

pub use engine::{EngineInfo, configure_engine, engine_info, restart_engine, start_engine};
pub use images::{
    ImageStatusReport, commit_container, image_status, pull_image, remove_container,
    remove_image, rename_container, tag_image,
};
pub use session::{exec_container, run_container};

use crate::engine::EngineSelector;
use crate::error::Result as RfswiftResult;
use crate::session::{SessionEnd, SessionOutcome};

/// Outcome of an rfswift command.
///
/// Commands return either outright success or the exit code of the remote
/// process, which the CLI adapter maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command completed successfully (exit code 0).
    Success,
    /// The remote process exited with a non-zero code.
    CommandExit {
        /// The exit code reported by the container engine.
        code: i64,
    },
}

impl From<&SessionOutcome> for CommandOutcome {
    fn from(outcome: &SessionOutcome) -> Self {
        match outcome.end {
            SessionEnd::Exited { code } if code != 0 => Self::CommandExit { code },
            SessionEnd::Exited { .. } | SessionEnd::Disconnected => Self::Success,
        }
    }
}

/// Engine selection and the runtime commands block on.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    /// Selector resolving the engine for each command.
    pub selector: &'a EngineSelector,
    /// Runtime driving the engine calls.
    pub runtime_handle: &'a Handle,
}

impl<'a> EngineContext<'a> {
    /// Pairs a selector with a runtime handle.
    #[must_use]
    pub const fn new(selector: &'a EngineSelector, runtime_handle: &'a Handle) -> Self {
        Self {
            selector,
            runtime_handle,
        }
    }

    /// Opens a client for the resolved engine.
    fn client(&self) -> RfswiftResult<Docker> {
        self.selector.resolve().client()
    }
}
