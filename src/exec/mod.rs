// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`handle`] owns [`ProcessHandle`], the description of a single program
//!   invocation, and [`RunningProcess`], its launched counterpart.
//! - [`stdio`] defines the I/O endpoints a handle can be bound to and the
//!   pumps that serve in-process endpoints.
//! - [`pipe`] provides the in-process links that connect pipeline stages.
//!
//! Processes are spawned with `tokio::process::Command`.

pub mod handle;
pub mod pipe;
pub mod stdio;

pub use handle::{ProcessHandle, RunningProcess};
pub use pipe::{DEFAULT_LINK_CAPACITY, PipeReader, PipeWriter, pipe_link};
pub use stdio::{Capture, Input, Output};
