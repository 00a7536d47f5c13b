// src/job.rs

//! Turning configured jobs into process handles and running them.

use tracing::info;

use crate::config::model::JobConfig;
use crate::errors::Result;
use crate::exec::ProcessHandle;
use crate::shell::Shell;
use crate::types::JobMode;

/// The shell a job's stages run in: the base shell with the job's own
/// overlay layered on top.
pub fn job_shell(base: &Shell, job: &JobConfig) -> Shell {
    if job.env.is_empty() {
        return base.clone();
    }
    let mut env = base.env().clone();
    env.extend_from(&job.env);
    base.clone().with_env(env)
}

/// One handle per stage, in order.
pub fn build_handles(shell: &Shell, job: &JobConfig) -> Vec<ProcessHandle> {
    job.stages
        .iter()
        .map(|stage| {
            let handle = shell.command(stage.cmd.as_str(), stage.args.iter().map(String::as_str));
            if stage.merge_stderr {
                handle.combine()
            } else {
                handle
            }
        })
        .collect()
}

/// Run a single job according to its mode.
pub async fn run_job(base: &Shell, name: &str, job: &JobConfig) -> Result<()> {
    let shell = job_shell(base, job);
    let handles = build_handles(&shell, job);

    info!(job = %name, mode = %job.mode, stages = handles.len(), "running job");

    let result = match job.mode {
        JobMode::Pipe => shell.pipe(handles).await,
        JobMode::Or => shell.or(handles).await,
        JobMode::And => shell.and(handles).await,
    };

    match &result {
        Ok(()) => info!(job = %name, "job succeeded"),
        Err(err) => info!(job = %name, error = %err, "job failed"),
    }
    result
}
