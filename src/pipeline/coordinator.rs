// src/pipeline/coordinator.rs

//! Concurrent pipeline execution (`a | b | c`).

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{ProcpipeError, Result};
use crate::exec::{DEFAULT_LINK_CAPACITY, Input, Output, ProcessHandle, pipe_link};

/// Tuning knobs for [`run_pipeline_with`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Bytes buffered by each link before the producing stage is suspended.
    pub link_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            link_capacity: DEFAULT_LINK_CAPACITY,
        }
    }
}

/// Result reported by one stage when it terminates.
#[derive(Debug)]
pub struct StageStatus {
    pub index: usize,
    pub result: Result<()>,
}

/// Run `handles` as a pipeline with default options.
///
/// See [`run_pipeline_with`].
pub async fn run_pipeline(handles: Vec<ProcessHandle>) -> Result<()> {
    run_pipeline_with(handles, &PipelineOptions::default()).await
}

/// Run `handles` as a pipeline: stdout of each stage feeds the stdin of the
/// next, and all stages run concurrently.
///
/// The first stage keeps its configured stdin and the last stage keeps its
/// configured stdout and stderr. The result is the result of the last stage;
/// failures of earlier stages are logged and discarded, as in a shell.
///
/// An empty pipeline succeeds without starting anything. No timeout is
/// applied: if the last stage never finishes, neither does this future.
/// Dropping the future aborts every stage and kills its process.
pub async fn run_pipeline_with(
    mut handles: Vec<ProcessHandle>,
    options: &PipelineOptions,
) -> Result<()> {
    let n = handles.len();
    if n == 0 {
        debug!("empty pipeline; nothing to run");
        return Ok(());
    }

    link_stages(&mut handles, options.link_capacity);

    let commands: Vec<String> = handles.iter().map(ProcessHandle::command_line).collect();
    info!(stages = n, ?commands, "starting pipeline");

    // One slot per stage, so no stage ever blocks while reporting.
    let (status_tx, mut status_rx) = mpsc::channel::<StageStatus>(n);
    let mut stages = JoinSet::new();

    for (index, handle) in handles.into_iter().enumerate() {
        let tx = status_tx.clone();
        stages.spawn(async move {
            let result = run_stage(handle).await;
            if tx.send(StageStatus { index, result }).await.is_err() {
                debug!(stage = index, "pipeline coordinator gone; dropping stage status");
            }
        });
    }
    drop(status_tx);

    let result = collect_statuses(&mut status_rx, n).await;

    // Every stage task has reported (or died); reap them.
    while let Some(joined) = stages.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "pipeline stage task did not complete");
        }
    }

    info!(success = result.is_ok(), "pipeline finished");
    result
}

/// Receive up to `n` stage statuses and return the terminal stage's result.
///
/// If the channel closes before the terminal stage reported, the result is
/// [`ProcpipeError::StageLost`].
pub(crate) async fn collect_statuses(
    status_rx: &mut mpsc::Receiver<StageStatus>,
    n: usize,
) -> Result<()> {
    let terminal = n.saturating_sub(1);
    let mut terminal_result = None;
    let mut reported = 0usize;

    while reported < n {
        let Some(status) = status_rx.recv().await else {
            break;
        };
        reported += 1;

        match &status.result {
            Ok(()) => debug!(stage = status.index, "pipeline stage finished"),
            Err(err) if status.index != terminal => {
                debug!(stage = status.index, error = %err, "discarding failure of non-terminal stage");
            }
            Err(err) => debug!(stage = status.index, error = %err, "terminal stage failed"),
        }

        if status.index == terminal {
            terminal_result = Some(status.result);
        }
    }

    if reported < n {
        warn!(reported, expected = n, "some pipeline stages never reported");
    }

    terminal_result.unwrap_or(Err(ProcpipeError::StageLost { index: terminal }))
}

/// Connect each adjacent pair of stages with a fresh pipe link.
fn link_stages(handles: &mut [ProcessHandle], capacity: usize) {
    for i in 1..handles.len() {
        let (reader, writer) = pipe_link(capacity);
        handles[i - 1].replace_stdout(Output::Pipe(writer));
        handles[i].replace_stdin(Input::Pipe(reader));
    }
}

/// Start one stage and wait for it.
///
/// Waiting closes the write end of the stage's outgoing link once the
/// process has exited and its output is fully flushed. On launch failure
/// the handle is dropped, which closes the link as well.
async fn run_stage(handle: ProcessHandle) -> Result<()> {
    let running = handle.start()?;
    running.wait().await
}
