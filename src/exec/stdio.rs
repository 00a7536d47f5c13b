// src/exec/stdio.rs

//! I/O endpoints a [`super::ProcessHandle`] can be bound to.
//!
//! Endpoints backed by an OS handle (`Inherit`, `Null`, `File`) are passed to
//! the child directly. In-process endpoints (bytes, captures, pipe links,
//! arbitrary async readers/writers) are served by pump tasks that copy
//! between the child's OS pipe and the endpoint.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::ChildStdin;

use crate::exec::pipe::{PipeReader, PipeWriter};
use crate::types::StreamSetting;

/// Shared in-memory buffer collecting the output of a process.
///
/// Clones share the same buffer, so a caller keeps one clone and hands the
/// other to the process.
#[derive(Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the bytes collected so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Collected bytes as a string, replacing invalid UTF-8.
    pub fn string(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn append(&self, data: &[u8]) {
        self.lock().extend_from_slice(data);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // A panic while appending leaves the buffer usable.
        self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture").field("len", &self.len()).finish()
    }
}

/// Where a process reads its standard input from.
pub enum Input {
    /// Standard input of the invoking process.
    Inherit,
    Null,
    /// Fixed bytes, followed by end-of-stream.
    Bytes(Vec<u8>),
    File(std::fs::File),
    /// Read end of a pipe link (set up by the pipeline coordinator).
    Pipe(PipeReader),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl Input {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Input::Bytes(data.into())
    }

    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Split into the child's stdio configuration and an optional source
    /// that must be pumped into the child's stdin.
    pub(crate) fn into_parts(self) -> (Stdio, Option<Source>) {
        match self {
            Input::Inherit => (Stdio::inherit(), None),
            Input::Null => (Stdio::null(), None),
            Input::File(file) => (Stdio::from(file), None),
            Input::Bytes(data) => (Stdio::piped(), Some(Source::Bytes(data))),
            Input::Pipe(reader) => (Stdio::piped(), Some(Source::Pipe(reader))),
            Input::Reader(reader) => (Stdio::piped(), Some(Source::Reader(reader))),
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Input::Inherit
    }
}

impl From<StreamSetting> for Input {
    fn from(setting: StreamSetting) -> Self {
        match setting {
            StreamSetting::Inherit => Input::Inherit,
            StreamSetting::Null => Input::Null,
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Inherit => f.write_str("Inherit"),
            Input::Null => f.write_str("Null"),
            Input::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Input::File(file) => f.debug_tuple("File").field(file).finish(),
            Input::Pipe(reader) => f.debug_tuple("Pipe").field(reader).finish(),
            Input::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Where a process writes one of its output streams.
pub enum Output {
    /// The matching stream (stdout or stderr) of the invoking process.
    Inherit,
    Null,
    File(std::fs::File),
    Capture(Capture),
    /// Write end of a pipe link (set up by the pipeline coordinator).
    Pipe(PipeWriter),
    /// Arbitrary writer; it is flushed but never shut down.
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl Output {
    pub fn writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Output::Writer(Box::new(writer))
    }

    /// Split into the child's stdio configuration and an optional sink the
    /// child's output must be pumped into.
    pub(crate) fn into_parts(self, stream: StdStream) -> (Stdio, Option<Sink>) {
        match self {
            Output::Inherit => (Stdio::inherit(), None),
            Output::Null => (Stdio::null(), None),
            Output::File(file) => (Stdio::from(file), None),
            other => (Stdio::piped(), other.into_sink(stream)),
        }
    }

    /// Turn into a sink that is always written by a pump. `None` means the
    /// output is discarded.
    pub(crate) fn into_sink(self, stream: StdStream) -> Option<Sink> {
        match self {
            Output::Inherit => Some(match stream {
                StdStream::Stdout => Sink::Stdout(tokio::io::stdout()),
                StdStream::Stderr => Sink::Stderr(tokio::io::stderr()),
            }),
            Output::Null => None,
            Output::File(file) => Some(Sink::File(tokio::fs::File::from_std(file))),
            Output::Capture(capture) => Some(Sink::Capture(capture)),
            Output::Pipe(writer) => Some(Sink::Pipe(writer)),
            Output::Writer(writer) => Some(Sink::Writer(writer)),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Output::Inherit
    }
}

impl From<StreamSetting> for Output {
    fn from(setting: StreamSetting) -> Self {
        match setting {
            StreamSetting::Inherit => Output::Inherit,
            StreamSetting::Null => Output::Null,
        }
    }
}

impl From<Capture> for Output {
    fn from(capture: Capture) -> Self {
        Output::Capture(capture)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Inherit => f.write_str("Inherit"),
            Output::Null => f.write_str("Null"),
            Output::File(file) => f.debug_tuple("File").field(file).finish(),
            Output::Capture(capture) => f.debug_tuple("Capture").field(capture).finish(),
            Output::Pipe(writer) => f.debug_tuple("Pipe").field(writer).finish(),
            Output::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Which standard output stream of the child an [`Output`] is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StdStream {
    Stdout,
    Stderr,
}

/// In-process source pumped into a child's stdin.
pub(crate) enum Source {
    Bytes(Vec<u8>),
    Pipe(PipeReader),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl Source {
    /// Copy everything into `stdin`, then close it so the child sees EOF.
    pub(crate) async fn feed(self, mut stdin: ChildStdin) -> io::Result<()> {
        match self {
            Source::Bytes(data) => stdin.write_all(&data).await?,
            Source::Pipe(mut reader) => {
                tokio::io::copy(&mut reader, &mut stdin).await?;
            }
            Source::Reader(mut reader) => {
                tokio::io::copy(&mut reader, &mut stdin).await?;
            }
        }
        stdin.shutdown().await
    }
}

/// In-process destination for a child's stdout/stderr.
pub(crate) enum Sink {
    Stdout(tokio::io::Stdout),
    Stderr(tokio::io::Stderr),
    File(tokio::fs::File),
    Capture(Capture),
    Pipe(PipeWriter),
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl Sink {
    pub(crate) async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout(out) => out.write_all(data).await,
            Sink::Stderr(err) => err.write_all(data).await,
            Sink::File(file) => file.write_all(data).await,
            Sink::Capture(capture) => {
                capture.append(data);
                Ok(())
            }
            Sink::Pipe(writer) => writer.write_all(data).await,
            Sink::Writer(writer) => writer.write_all(data).await,
        }
    }

    /// Flush buffered data and let go of the endpoint.
    ///
    /// Releasing a pipe link closes its write end.
    pub(crate) async fn release(self) -> io::Result<()> {
        match self {
            Sink::Stdout(mut out) => out.flush().await,
            Sink::Stderr(mut err) => err.flush().await,
            Sink::File(mut file) => file.flush().await,
            Sink::Capture(_) => Ok(()),
            Sink::Pipe(mut writer) => writer.close().await,
            Sink::Writer(mut writer) => writer.flush().await,
        }
    }
}

/// Copy a child's output stream into a (possibly shared) sink until EOF.
pub(crate) async fn drain<R>(mut reader: R, sink: Arc<tokio::sync::Mutex<Sink>>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        sink.lock().await.write_all(&buf[..n]).await?;
    }
}
