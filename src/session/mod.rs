//! Interactive container sessions.
//!
//! A session creates a container (`run`) or opens a shell in an existing one
//! (`exec`), then bridges the local standard streams to the remote process
//! until it exits. Raw terminal mode, resize propagation, and the closing
//! summary line are handled by the bridge; the lifecycle calls go through
//! the [`ContainerSessionClient`] and [`ContainerExecClient`] seams so the
//! flows run against mocks in tests.

mod bridge;
mod client;
mod config;
mod exec;
mod input;
mod lookup;
mod resize;
mod run;
mod terminal;

pub use bridge::{DEFAULT_EXIT_GRACE, SessionContext, SessionEnd, SessionIo};
pub use client::{
    AttachFuture, AttachedStreams, ContainerExecClient, ContainerSessionClient,
    CreateContainerFuture, CreateExecFuture, InputSink, InspectContainerFuture, InspectExecFuture,
    ListContainersFuture, OutputStream, StartExecFuture, UnitFuture, WaitFuture,
};
pub use config::{
    DEFAULT_SHELL, PROJECT_LABEL_KEY, PROJECT_LABEL_VALUE, SessionConfig, build_create_body,
    project_label_filter,
};
pub use exec::exec_session_async;
pub use input::DetachedReader;
pub use lookup::{SessionContainer, latest_session_container, list_session_containers};
pub use resize::{
    ChangedFuture, PollingResizeSource, RESIZE_POLL_INTERVAL, ResizeSource, ResizeTracker,
    TtyResizer, platform_resize_source,
};
#[cfg(unix)]
pub use resize::SignalResizeSource;
pub use run::run_session_async;
pub use terminal::{CrosstermTerminal, RawModeGuard, TerminalControl, TerminalSize};

pub(crate) use client::is_not_found;

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// The container the session ran in.
    pub container_id: String,
    /// How the session ended.
    pub end: SessionEnd,
}

impl SessionOutcome {
    /// The remote exit code, when one was reported.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i64> {
        self.end.exit_code()
    }
}
