//! Bridges local standard streams to an attached remote process.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bollard::container::LogOutput;
use bollard::errors::Error as BollardError;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::client::{AttachedStreams, InputSink, OutputStream};
use super::input::DetachedReader;
use super::resize::{ResizeSource, ResizeTracker, TtyResizer};
use super::terminal::{RawModeGuard, TerminalControl, TerminalSize};
use crate::error::{ContainerError, RfswiftError};

/// How long to wait for an exit code once remote output has closed.
pub const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(2);

/// Local standard streams of a session.
pub struct SessionIo {
    /// Bytes forwarded to the remote process.
    pub stdin: Pin<Box<dyn AsyncRead + Send>>,
    /// Destination for remote stdout (and TTY output).
    pub stdout: Pin<Box<dyn AsyncWrite + Send>>,
    /// Destination for remote stderr and the closing summary.
    pub stderr: Pin<Box<dyn AsyncWrite + Send>>,
}

impl SessionIo {
    /// The process's own standard streams.
    ///
    /// Stdin is read on a detached thread so that a pending read never holds
    /// up runtime shutdown.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the stdin thread.
    pub fn stdio() -> io::Result<Self> {
        Ok(Self {
            stdin: Box::pin(DetachedReader::stdin()?),
            stdout: Box::pin(tokio::io::stdout()),
            stderr: Box::pin(tokio::io::stderr()),
        })
    }
}

/// Local side of a session: streams, terminal, and resize events.
pub struct SessionContext {
    /// Standard streams.
    pub io: SessionIo,
    /// The local terminal.
    pub terminal: Box<dyn TerminalControl>,
    /// Window-change notifications; `None` disables resize propagation.
    pub resize_events: Option<Box<dyn ResizeSource>>,
    /// Grace period for the exit code after remote output closes.
    pub exit_grace: Duration,
}

impl SessionContext {
    /// The real terminal with platform resize events.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::TerminalFailed` when the resize signal cannot
    /// be registered or stdin cannot be read. Must be called from within a
    /// Tokio runtime.
    pub fn system() -> Result<Self, RfswiftError> {
        let terminal = super::terminal::CrosstermTerminal;
        let resize_events = if terminal.is_terminal() {
            Some(super::resize::platform_resize_source().map_err(terminal_failed)?)
        } else {
            None
        };

        Ok(Self {
            io: SessionIo::stdio().map_err(terminal_failed)?,
            terminal: Box::new(terminal),
            resize_events,
            exit_grace: DEFAULT_EXIT_GRACE,
        })
    }

    /// Whether the session runs on an interactive terminal.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.terminal.is_terminal()
    }
}

/// Why a bridged session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The remote process reported its exit.
    Exited {
        /// Exit status of the remote process.
        code: i64,
    },
    /// Remote output closed before an exit status was available.
    Disconnected,
}

impl SessionEnd {
    /// The exit code, when known.
    #[must_use]
    pub const fn exit_code(self) -> Option<i64> {
        match self {
            Self::Exited { code } => Some(code),
            Self::Disconnected => None,
        }
    }
}

/// Future resolving to the remote exit code.
pub(crate) type ExitFuture<'a> =
    Pin<Box<dyn Future<Output = Result<i64, RfswiftError>> + Send + 'a>>;

/// Run the interactive bridge until the remote process exits or its output
/// closes.
///
/// The terminal enters raw mode only when it is interactive and a TTY was
/// allocated, and is restored before this function returns on every path.
pub(crate) async fn bridge<R: TtyResizer>(
    container_id: &str,
    streams: AttachedStreams,
    context: &mut SessionContext,
    resizer: &R,
    exit: ExitFuture<'_>,
) -> Result<SessionEnd, RfswiftError> {
    let SessionContext {
        io,
        terminal,
        resize_events,
        exit_grace,
    } = context;
    let AttachedStreams { mut output, input } = streams;
    let interactive = terminal.is_terminal();
    let guard = if interactive {
        Some(RawModeGuard::acquire(&**terminal).map_err(terminal_failed)?)
    } else {
        None
    };

    let stdin = std::mem::replace(&mut io.stdin, Box::pin(tokio::io::empty()));
    let stdin_task = spawn_stdin_pump(stdin, input);

    let mut pump = Pump {
        container_id,
        io: &mut *io,
        terminal: &**terminal,
        resize_events: if interactive { resize_events.take() } else { None },
        tracker: ResizeTracker::default(),
    };
    if interactive && let Some(size) = pump.terminal.size() {
        let initial = pump.tracker.initial(size);
        propagate(container_id, resizer, initial).await;
    }

    let outcome = pump.run(&mut output, resizer, exit, *exit_grace).await;

    stdin_task.abort();
    drop(stdin_task.await);
    drop(guard);

    let end = outcome?;
    let summary = match end {
        SessionEnd::Exited { code } => {
            format!("\r\nsession in container {container_id} ended (exit code {code})\r\n")
        }
        SessionEnd::Disconnected => {
            format!("\r\nsession in container {container_id} ended (connection closed)\r\n")
        }
    };
    write_best_effort(&mut io.stderr, summary.as_bytes()).await;
    info!(container_id, ?end, "session ended");
    Ok(end)
}

/// Borrowed session state driven by the output loop.
struct Pump<'a> {
    container_id: &'a str,
    io: &'a mut SessionIo,
    terminal: &'a dyn TerminalControl,
    resize_events: Option<Box<dyn ResizeSource>>,
    tracker: ResizeTracker,
}

impl Pump<'_> {
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "false positive triggered inside tokio::select! expansion"
    )]
    async fn run<R: TtyResizer>(
        &mut self,
        output: &mut OutputStream,
        resizer: &R,
        mut exit: ExitFuture<'_>,
        exit_grace: Duration,
    ) -> Result<SessionEnd, RfswiftError> {
        let container_id = self.container_id;
        loop {
            tokio::select! {
                maybe_chunk = output.next() => {
                    if !write_output_chunk(container_id, maybe_chunk, self.io).await? {
                        debug!(container_id, "remote output closed");
                        return Ok(await_exit_within(exit, exit_grace).await);
                    }
                }
                code = &mut exit => {
                    drain_remaining(container_id, output, self.io).await;
                    return code.map(|exit_code| SessionEnd::Exited { code: exit_code });
                }
                more = next_resize_event(&mut self.resize_events) => {
                    if !more {
                        self.resize_events = None;
                        continue;
                    }
                    let changed = self.terminal.size().and_then(|size| self.tracker.observe(size));
                    if let Some(size) = changed {
                        propagate(container_id, resizer, size).await;
                    }
                }
            }
        }
    }
}

async fn next_resize_event(source: &mut Option<Box<dyn ResizeSource>>) -> bool {
    match source.as_mut() {
        Some(events) => events.changed().await,
        None => std::future::pending().await,
    }
}

async fn await_exit_within(exit: ExitFuture<'_>, grace: Duration) -> SessionEnd {
    match tokio::time::timeout(grace, exit).await {
        Ok(Ok(code)) => SessionEnd::Exited { code },
        Ok(Err(error)) => {
            warn!(%error, "could not read exit status");
            SessionEnd::Disconnected
        }
        Err(_) => SessionEnd::Disconnected,
    }
}

/// Flush output already buffered when the process exited; best effort.
async fn drain_remaining(
    container_id: &str,
    output: &mut OutputStream,
    io: &mut SessionIo,
) {
    let drain = async {
        while let Ok(true) = write_output_chunk(container_id, output.next().await, io).await {}
    };
    drop(tokio::time::timeout(Duration::from_millis(200), drain).await);
}

async fn propagate<R: TtyResizer>(container_id: &str, resizer: &R, size: TerminalSize) {
    if let Err(error) = resizer.resize(size).await {
        warn!(
            container_id,
            width = size.width,
            height = size.height,
            %error,
            "terminal resize failed"
        );
    }
}

fn spawn_stdin_pump(
    mut stdin: Pin<Box<dyn AsyncRead + Send>>,
    mut input: InputSink,
) -> JoinHandle<io::Result<()>> {
    tokio::spawn(async move {
        tokio::io::copy(&mut stdin, &mut input).await?;
        input.shutdown().await
    })
}

async fn write_output_chunk(
    container_id: &str,
    maybe_chunk: Option<Result<LogOutput, BollardError>>,
    io: &mut SessionIo,
) -> Result<bool, RfswiftError> {
    let Some(chunk_result) = maybe_chunk else {
        return Ok(false);
    };
    let chunk = chunk_result.map_err(|error| attach_failed(container_id, error.to_string()))?;

    let (target, message) = match chunk {
        LogOutput::StdErr { message } => (&mut io.stderr, message),
        LogOutput::StdOut { message }
        | LogOutput::Console { message }
        | LogOutput::StdIn { message } => (&mut io.stdout, message),
    };
    target
        .write_all(message.as_ref())
        .await
        .map_err(|error| attach_failed(container_id, format!("failed writing output: {error}")))?;
    target
        .flush()
        .await
        .map_err(|error| attach_failed(container_id, format!("failed flushing output: {error}")))?;

    Ok(true)
}

async fn write_best_effort(target: &mut Pin<Box<dyn AsyncWrite + Send>>, bytes: &[u8]) {
    if let Err(error) = target.write_all(bytes).await {
        debug!(%error, "failed writing session summary");
        return;
    }
    drop(target.flush().await);
}

fn attach_failed(container_id: &str, message: String) -> RfswiftError {
    RfswiftError::from(ContainerError::AttachFailed {
        container_id: String::from(container_id),
        message,
    })
}

fn terminal_failed(error: io::Error) -> RfswiftError {
    RfswiftError::from(ContainerError::TerminalFailed {
        message: error.to_string(),
    })
}
