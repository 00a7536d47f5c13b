use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the stages of a job are combined.
///
/// - `Pipe`: run all stages concurrently, stdout of each feeding the next
///   stage's stdin (default).
/// - `Or`: run stages one after another until one succeeds.
/// - `And`: run stages one after another until one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobMode {
    Pipe,
    Or,
    And,
}

impl Default for JobMode {
    fn default() -> Self {
        JobMode::Pipe
    }
}

impl fmt::Display for JobMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobMode::Pipe => "pipe",
            JobMode::Or => "or",
            JobMode::And => "and",
        };
        f.write_str(s)
    }
}

impl FromStr for JobMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pipe" => Ok(JobMode::Pipe),
            "or" => Ok(JobMode::Or),
            "and" => Ok(JobMode::And),
            other => Err(format!(
                "invalid job mode: {other} (expected \"pipe\", \"or\" or \"and\")"
            )),
        }
    }
}

/// Default binding for one of the standard streams of a new process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSetting {
    /// Share the stream of the invoking process.
    Inherit,
    /// Connect to the null device.
    Null,
}

impl Default for StreamSetting {
    fn default() -> Self {
        StreamSetting::Inherit
    }
}

/// Merge one output stream of a process into the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// stderr goes wherever stdout goes.
    StderrToStdout,
    /// stdout goes wherever stderr goes.
    StdoutToStderr,
}
