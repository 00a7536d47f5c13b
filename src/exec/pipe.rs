// src/exec/pipe.rs

//! In-process pipe links between pipeline stages.
//!
//! A link is a bounded, single-producer single-consumer byte conduit built
//! on [`tokio::io::duplex`]. Only one direction of the duplex stream is
//! exposed: the writer half can only write, the reader half can only read.
//!
//! - Closing the [`PipeWriter`] (explicitly or by dropping it) makes the
//!   [`PipeReader`] observe end-of-stream once buffered bytes are drained.
//! - Writing after close, or after the reader was dropped, fails with
//!   [`io::ErrorKind::BrokenPipe`].
//! - When the buffer is full the writer is suspended until the reader makes
//!   room, so a slow consumer only slows down its own producer.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

/// Default number of bytes a link buffers before applying back-pressure.
pub const DEFAULT_LINK_CAPACITY: usize = 64 * 1024;

/// Create a new pipe link buffering at most `capacity` bytes.
///
/// A capacity of zero is rounded up to one byte.
pub fn pipe_link(capacity: usize) -> (PipeReader, PipeWriter) {
    let (read_end, write_end) = tokio::io::duplex(capacity.max(1));
    (
        PipeReader { inner: read_end },
        PipeWriter {
            inner: Some(write_end),
        },
    )
}

/// Read end of a pipe link.
#[derive(Debug)]
pub struct PipeReader {
    inner: DuplexStream,
}

impl AsyncRead for PipeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

/// Write end of a pipe link.
#[derive(Debug)]
pub struct PipeWriter {
    inner: Option<DuplexStream>,
}

impl PipeWriter {
    /// Close the write end, signalling end-of-stream to the reader.
    ///
    /// A write end is closed exactly once: a second call returns a
    /// `BrokenPipe` error and has no other effect.
    pub async fn close(&mut self) -> io::Result<()> {
        match self.inner.take() {
            Some(mut stream) => stream.shutdown().await,
            None => Err(closed_error()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl AsyncWrite for PipeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.inner.as_mut() {
            Some(stream) => Pin::new(stream).poll_write(cx, buf),
            None => Poll::Ready(Err(closed_error())),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.inner.as_mut() {
            Some(stream) => Pin::new(stream).poll_flush(cx),
            None => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.inner.as_mut() {
            Some(stream) => {
                let res = Pin::new(stream).poll_shutdown(cx);
                if res.is_ready() {
                    self.inner = None;
                }
                res
            }
            None => Poll::Ready(Ok(())),
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe link write end is closed")
}
