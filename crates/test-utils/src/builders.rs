#![allow(dead_code)]

use std::collections::BTreeMap;

use procpipe::ProcessHandle;
use procpipe::config::{ConfigFile, ConfigSection, JobConfig, RawConfigFile, StageConfig};
use procpipe::types::JobMode;
use procpipe::EnvOverlay;

/// `sh -c <script>` with inherited streams.
pub fn sh(script: &str) -> ProcessHandle {
    ProcessHandle::new("sh").arg("-c").arg(script)
}

/// A handle that exits 0 without output.
pub fn succeed() -> ProcessHandle {
    ProcessHandle::new("true")
}

/// A handle that exits with `code`.
pub fn fail_with(code: i32) -> ProcessHandle {
    sh(&format!("exit {code}"))
}

/// A handle whose executable does not exist.
pub fn missing() -> ProcessHandle {
    ProcessHandle::new("procpipe-test-no-such-binary")
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                env: EnvOverlay::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobConfig) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.config.env.set(key, value);
        self
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.config.config.pipe_capacity = capacity;
        self
    }

    /// The raw config, for tests that exercise validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(mode: JobMode) -> Self {
        Self {
            job: JobConfig {
                mode,
                env: EnvOverlay::default(),
                stages: vec![],
            },
        }
    }

    pub fn stage(mut self, cmd: &str, args: &[&str]) -> Self {
        self.job.stages.push(StageConfig {
            cmd: cmd.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            merge_stderr: false,
        });
        self
    }

    /// Like [`JobConfigBuilder::stage`] with stderr merged into stdout.
    pub fn merged_stage(mut self, cmd: &str, args: &[&str]) -> Self {
        self.job.stages.push(StageConfig {
            cmd: cmd.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            merge_stderr: true,
        });
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.set(key, value);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
