// src/fatal.rs

//! Opt-in "report and terminate" helpers.
//!
//! Nothing in the core calls these; they are for binaries and scripts that
//! prefer to stop at the first failure instead of handling the error.

use tracing::error;

use crate::errors::{ProcpipeError, Result};

/// Unwrap `result`, or log the error and terminate the process.
///
/// The exit code follows [`ProcpipeError::exit_code`].
pub fn must<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            let code = err.exit_code();
            error!(error = %err, exit_code = code, "fatal error; terminating");
            eprintln!("procpipe: {err}");
            std::process::exit(code)
        }
    }
}

/// Exit code for an error that reached the binary boundary.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ProcpipeError>()
        .map(ProcpipeError::exit_code)
        .unwrap_or(1)
}
