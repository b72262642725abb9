//! Window-size change events and resize propagation.
//!
//! POSIX terminals announce size changes with `SIGWINCH`; Windows has no
//! equivalent, so the size is polled on a sub-second timer instead. Both
//! sources feed the same [`ResizeTracker`], which suppresses repeats so the
//! engine only sees real changes.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bollard::exec::ResizeExecOptions;

use super::client::{ContainerExecClient, ContainerSessionClient, UnitFuture};
use super::terminal::TerminalSize;

/// Interval between size polls where no resize signal exists.
pub const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Boxed future returned by [`ResizeSource::changed`].
pub type ChangedFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// A stream of "the window may have changed" notifications.
pub trait ResizeSource: Send {
    /// Waits for the next notification.
    ///
    /// Resolves to `false` once the source can produce no more events.
    fn changed(&mut self) -> ChangedFuture<'_>;
}

/// Signal-driven source backed by `SIGWINCH`.
#[cfg(unix)]
pub struct SignalResizeSource {
    signal: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalResizeSource {
    /// Subscribes to window-change signals.
    ///
    /// # Errors
    ///
    /// Returns the error from registering the signal handler. Must be called
    /// from within a Tokio runtime.
    pub fn new() -> io::Result<Self> {
        let signal =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::window_change())?;
        Ok(Self { signal })
    }
}

#[cfg(unix)]
impl ResizeSource for SignalResizeSource {
    fn changed(&mut self) -> ChangedFuture<'_> {
        Box::pin(async move { self.signal.recv().await.is_some() })
    }
}

/// Timer-driven source that ticks at a bounded rate.
pub struct PollingResizeSource {
    interval: tokio::time::Interval,
}

impl PollingResizeSource {
    /// Creates a source ticking every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self { interval }
    }
}

impl ResizeSource for PollingResizeSource {
    fn changed(&mut self) -> ChangedFuture<'_> {
        Box::pin(async move {
            self.interval.tick().await;
            true
        })
    }
}

/// The resize source suited to the current platform.
///
/// # Errors
///
/// Returns the signal registration error on POSIX platforms.
#[cfg(unix)]
pub fn platform_resize_source() -> io::Result<Box<dyn ResizeSource>> {
    Ok(Box::new(SignalResizeSource::new()?))
}

/// The resize source suited to the current platform.
///
/// # Errors
///
/// Never fails on this platform.
#[cfg(not(unix))]
pub fn platform_resize_source() -> io::Result<Box<dyn ResizeSource>> {
    Ok(Box::new(PollingResizeSource::new(RESIZE_POLL_INTERVAL)))
}

/// Remembers the last propagated size.
#[derive(Debug, Default)]
pub struct ResizeTracker {
    last: Option<TerminalSize>,
}

impl ResizeTracker {
    /// Records the size propagated right after attach; always returned.
    pub const fn initial(&mut self, size: TerminalSize) -> TerminalSize {
        self.last = Some(size);
        size
    }

    /// Returns `size` when it differs from the last propagated size.
    pub fn observe(&mut self, size: TerminalSize) -> Option<TerminalSize> {
        if self.last == Some(size) {
            return None;
        }
        self.last = Some(size);
        Some(size)
    }
}

/// Sends a new size to the remote pseudo-terminal.
pub trait TtyResizer: Sync {
    /// Resize the remote terminal to `size`.
    fn resize(&self, size: TerminalSize) -> UnitFuture<'_>;
}

/// Resizes a container's primary TTY (`run` sessions).
pub(crate) struct ContainerTty<'a, C> {
    pub(crate) client: &'a C,
    pub(crate) container_id: &'a str,
}

impl<C: ContainerSessionClient + Sync> TtyResizer for ContainerTty<'_, C> {
    fn resize(&self, size: TerminalSize) -> UnitFuture<'_> {
        self.client
            .resize_container_tty(self.container_id, size.width, size.height)
    }
}

/// Resizes an exec process's TTY (`exec` sessions).
pub(crate) struct ExecTty<'a, C> {
    pub(crate) client: &'a C,
    pub(crate) exec_id: &'a str,
}

impl<C: ContainerExecClient + Sync> TtyResizer for ExecTty<'_, C> {
    fn resize(&self, size: TerminalSize) -> UnitFuture<'_> {
        self.client.resize_exec(
            self.exec_id,
            ResizeExecOptions {
                width: size.width,
                height: size.height,
            },
        )
    }
}
