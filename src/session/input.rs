//! Standard input read on a detached thread.
//!
//! A blocking read of the process's stdin cannot be cancelled. Tokio's own
//! `stdin()` parks that read on the runtime's blocking pool, so dropping the
//! runtime would wait for the next keypress. [`DetachedReader`] reads on a
//! plain thread instead and hands chunks over a channel; once the reader is
//! dropped the thread exits after its current read returns.

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

/// Bytes requested from the underlying reader per read.
const READ_CHUNK: usize = 4096;

/// Chunks buffered between the reading thread and the session.
const CHANNEL_DEPTH: usize = 16;

/// Async view of a blocking reader serviced by its own thread.
pub struct DetachedReader {
    receiver: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
}

impl DetachedReader {
    /// The process's standard input.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the reading thread.
    pub fn stdin() -> io::Result<Self> {
        Self::spawn(io::stdin(), "rfswift-stdin")
    }

    /// Read `reader` on a detached thread named `name`.
    ///
    /// # Errors
    ///
    /// Returns the error from spawning the reading thread.
    pub fn spawn<R>(reader: R, name: &str) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(CHANNEL_DEPTH);
        drop(
            thread::Builder::new()
                .name(String::from(name))
                .spawn(move || forward(reader, &sender))?,
        );
        Ok(Self {
            receiver,
            pending: Vec::new(),
        })
    }
}

fn forward<R: Read>(mut reader: R, sender: &mpsc::Sender<io::Result<Vec<u8>>>) {
    let mut buffer = vec![0_u8; READ_CHUNK];
    loop {
        let chunk = match reader.read(&mut buffer) {
            Ok(0) => return,
            Ok(read) => Ok(buffer.get(..read).map(<[u8]>::to_vec).unwrap_or_default()),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => Err(error),
        };
        let failed = chunk.is_err();
        if sender.blocking_send(chunk).is_err() || failed {
            return;
        }
    }
}

impl AsyncRead for DetachedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pending.is_empty() {
            match this.receiver.poll_recv(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Ready(Some(Err(error))) => return Poll::Ready(Err(error)),
                Poll::Ready(Some(Ok(chunk))) => this.pending = chunk,
            }
        }

        let take = this.pending.len().min(buf.remaining());
        let rest = this.pending.split_off(take);
        buf.put_slice(&this.pending);
        this.pending = rest;
        Poll::Ready(Ok(()))
    }
}
