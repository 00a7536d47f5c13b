// src/config/validate.rs

use crate::config::model::{ConfigFile, JobConfig, RawConfigFile};
use crate::env::EnvOverlay;
use crate::errors::{ProcpipeError, Result};
use crate::types::JobMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ProcpipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.env, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_global_config(cfg)?;
    validate_env("[env]", &cfg.env)?;
    for (name, job) in cfg.job.iter() {
        validate_job(name, job)?;
    }
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(ProcpipeError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.pipe_capacity == 0 {
        return Err(ProcpipeError::ConfigError(
            "[config].pipe_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_job(name: &str, job: &JobConfig) -> Result<()> {
    // An empty pipeline is a valid no-op; an empty or/and chain is not useful.
    if job.stages.is_empty() && job.mode != JobMode::Pipe {
        return Err(ProcpipeError::ConfigError(format!(
            "job '{}' with mode \"{}\" needs at least one stage",
            name, job.mode
        )));
    }

    for (index, stage) in job.stages.iter().enumerate() {
        if stage.cmd.trim().is_empty() {
            return Err(ProcpipeError::ConfigError(format!(
                "job '{}' stage {} has an empty `cmd`",
                name, index
            )));
        }
    }

    validate_env(&format!("[job.{name}].env"), &job.env)
}

fn validate_env(section: &str, env: &EnvOverlay) -> Result<()> {
    for (key, value) in env.iter() {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ProcpipeError::ConfigError(format!(
                "{} has invalid variable name {:?}",
                section, key
            )));
        }
        if value.contains('\0') {
            return Err(ProcpipeError::ConfigError(format!(
                "{} variable '{}' contains a NUL byte",
                section, key
            )));
        }
    }
    Ok(())
}
