// src/pipeline/combinators.rs

//! Sequential `||` / `&&` style combinators.

use tracing::debug;

use crate::errors::{ProcpipeError, Result};
use crate::exec::ProcessHandle;

/// Run handles one at a time until one succeeds.
///
/// Handles after the first success are never started. If every handle fails
/// (or there are none) the result is [`ProcpipeError::NoneSucceeded`]; the
/// individual errors are only logged.
pub async fn run_or(handles: Vec<ProcessHandle>) -> Result<()> {
    for (index, handle) in handles.into_iter().enumerate() {
        let command = handle.command_line();
        match handle.run().await {
            Ok(()) => {
                debug!(index, %command, "alternative succeeded");
                return Ok(());
            }
            Err(err) => debug!(index, %command, error = %err, "alternative failed"),
        }
    }
    Err(ProcpipeError::NoneSucceeded)
}

/// Run handles one at a time, stopping at the first failure.
///
/// Returns that failure; handles after it are never started.
pub async fn run_and(handles: Vec<ProcessHandle>) -> Result<()> {
    for (index, handle) in handles.into_iter().enumerate() {
        let command = handle.command_line();
        if let Err(err) = handle.run().await {
            debug!(index, %command, error = %err, "step failed; skipping the rest");
            return Err(err);
        }
    }
    Ok(())
}
