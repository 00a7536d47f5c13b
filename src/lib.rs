// src/lib.rs

pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod exec;
pub mod fatal;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod shell;
pub mod types;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::config::model::{ConfigFile, JobConfig};
use crate::errors::{ProcpipeError, Result};
use crate::job::{build_handles, job_shell, run_job};

pub use crate::env::EnvOverlay;
pub use crate::exec::{Capture, Input, Output, ProcessHandle, RunningProcess};
pub use crate::pipeline::{PipelineOptions, run_and, run_or, run_pipeline, run_pipeline_with};
pub use crate::shell::Shell;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - job selection
/// - job execution
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    let jobs = select_jobs(&cfg, args.job.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg, &jobs);
        return Ok(());
    }

    let shell = Shell::from_config(&cfg.config, &cfg.env);

    // Ctrl-C → drop the running job. Its processes are killed on drop.
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        res = run_jobs(&shell, &jobs) => res,
        () = interrupted => {
            info!("Ctrl-C received; cancelling");
            Err(ProcpipeError::Interrupted)
        }
    }
}

async fn run_jobs(shell: &Shell, jobs: &[(&str, &JobConfig)]) -> Result<()> {
    for (name, job) in jobs {
        run_job(shell, name, job).await?;
    }
    Ok(())
}

/// The job named on the command line, or every job in name order.
fn select_jobs<'a>(cfg: &'a ConfigFile, name: Option<&str>) -> Result<Vec<(&'a str, &'a JobConfig)>> {
    match name {
        Some(name) => {
            let (key, job) = cfg
                .job
                .get_key_value(name)
                .ok_or_else(|| ProcpipeError::JobNotFound(name.to_string()))?;
            Ok(vec![(key.as_str(), job)])
        }
        None => Ok(cfg.job.iter().map(|(k, j)| (k.as_str(), j)).collect()),
    }
}

/// Simple dry-run output: print settings and the commands of each job.
fn print_dry_run(cfg: &ConfigFile, jobs: &[(&str, &JobConfig)]) {
    let base = Shell::from_config(&cfg.config, &cfg.env);

    println!("procpipe dry-run");
    println!("  config.pipe_capacity = {}", cfg.config.pipe_capacity);
    println!(
        "  config.stdin/stdout/stderr = {:?}/{:?}/{:?}",
        cfg.config.stdin, cfg.config.stdout, cfg.config.stderr
    );
    if !cfg.env.is_empty() {
        println!("  env:");
        for (k, v) in cfg.env.iter() {
            println!("    {k}={v}");
        }
    }
    println!();

    println!("jobs ({}):", jobs.len());
    for (name, job) in jobs {
        println!("  - {name} ({})", job.mode);
        for (k, v) in job.env.iter() {
            println!("      env: {k}={v}");
        }
        let shell = job_shell(&base, job);
        let separator = match job.mode {
            types::JobMode::Pipe => " | ",
            types::JobMode::Or => " || ",
            types::JobMode::And => " && ",
        };
        let line: Vec<String> = build_handles(&shell, job)
            .iter()
            .map(|h| {
                if h.get_merge().is_some() {
                    format!("{} 2>&1", h.command_line())
                } else {
                    h.command_line()
                }
            })
            .collect();
        println!("      {}", line.join(separator));
    }

    debug!("dry-run complete (no execution)");
}
