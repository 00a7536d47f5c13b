// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::env::EnvOverlay;
use crate::exec::DEFAULT_LINK_CAPACITY;
use crate::types::{JobMode, StreamSetting};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// pipe_capacity = 65536
/// stdout = "inherit"
///
/// [env]
/// GREETING = "hello"
///
/// [job.shout]
/// mode = "pipe"
/// stages = [
///   { cmd = "echo", args = ["abc"] },
///   { cmd = "tr", args = ["a-z", "A-Z"] },
/// ]
/// ```
///
/// All sections are optional at this level; [`ConfigFile`] is the
/// validated form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Global environment overlay from `[env]`.
    #[serde(default)]
    pub env: EnvOverlay,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub env: EnvOverlay,
    pub job: BTreeMap<String, JobConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        env: EnvOverlay,
        job: BTreeMap<String, JobConfig>,
    ) -> Self {
        Self { config, env, job }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Bytes buffered by each pipe link between stages.
    #[serde(default = "default_pipe_capacity")]
    pub pipe_capacity: usize,

    /// Default stdin of every stage (`"inherit"` or `"null"`).
    #[serde(default)]
    pub stdin: StreamSetting,

    #[serde(default)]
    pub stdout: StreamSetting,

    #[serde(default)]
    pub stderr: StreamSetting,
}

fn default_pipe_capacity() -> usize {
    DEFAULT_LINK_CAPACITY
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            pipe_capacity: default_pipe_capacity(),
            stdin: StreamSetting::default(),
            stdout: StreamSetting::default(),
            stderr: StreamSetting::default(),
        }
    }
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    /// `"pipe"` (default), `"or"` or `"and"`.
    #[serde(default)]
    pub mode: JobMode,

    /// Job-level overlay, layered on top of the global `[env]`.
    #[serde(default)]
    pub env: EnvOverlay,

    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

/// One command of a job.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Send this stage's stderr wherever its stdout goes.
    #[serde(default)]
    pub merge_stderr: bool,
}
