// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcpipeError {
    /// The executable could not be started (missing, not executable, ...).
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited with a nonzero status.
    #[error("'{program}' exited with status {code}")]
    ExitStatus { program: String, code: i32 },

    /// The process was terminated by a signal.
    #[error("'{program}' terminated by signal {signal}")]
    Signaled { program: String, signal: i32 },

    #[error("waiting for '{program}' failed: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Copying bytes between the process and one of its endpoints failed.
    #[error("stream of '{program}' failed: {source}")]
    Stream {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("none of the commands succeeded")]
    NoneSucceeded,

    #[error("pipeline stage {index} ended without reporting a status")]
    StageLost { index: usize },

    #[error("interrupted")]
    Interrupted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcpipeError {
    /// Exit code a CLI should use when terminating because of this error.
    ///
    /// A process that exited nonzero hands its own code through, like a
    /// shell does for the last stage of a pipe. Signals map to `128 + n`.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcpipeError::ExitStatus { code, .. } if *code != 0 => *code,
            ProcpipeError::Signaled { signal, .. } => 128 + signal,
            ProcpipeError::Interrupted => 130,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcpipeError>;
