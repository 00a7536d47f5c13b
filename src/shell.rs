// src/shell.rs

//! Explicit execution context: default streams, environment overlay and
//! pipe link capacity for the handles it creates.
//!
//! Nothing here is global. Two `Shell` values never share state, so
//! pipelines started from different shells cannot affect each other.

use crate::config::model::ConfigSection;
use crate::env::EnvOverlay;
use crate::errors::Result;
use crate::exec::{Capture, DEFAULT_LINK_CAPACITY, ProcessHandle};
use crate::pipeline::{PipelineOptions, run_and, run_or, run_pipeline_with};
use crate::types::StreamSetting;

#[derive(Debug, Clone)]
pub struct Shell {
    env: EnvOverlay,
    stdin: StreamSetting,
    stdout: StreamSetting,
    stderr: StreamSetting,
    pipe_capacity: usize,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            env: EnvOverlay::default(),
            stdin: StreamSetting::Inherit,
            stdout: StreamSetting::Inherit,
            stderr: StreamSetting::Inherit,
            pipe_capacity: DEFAULT_LINK_CAPACITY,
        }
    }
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a shell from the `[config]` section and global `[env]` of a
    /// config file.
    pub fn from_config(section: &ConfigSection, env: &EnvOverlay) -> Self {
        Self {
            env: env.clone(),
            stdin: section.stdin,
            stdout: section.stdout,
            stderr: section.stderr,
            pipe_capacity: section.pipe_capacity,
        }
    }

    pub fn with_env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    /// Add one override on top of the current overlay.
    pub fn set_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.set(key, value);
        self
    }

    pub fn with_stdin(mut self, setting: StreamSetting) -> Self {
        self.stdin = setting;
        self
    }

    pub fn with_stdout(mut self, setting: StreamSetting) -> Self {
        self.stdout = setting;
        self
    }

    pub fn with_stderr(mut self, setting: StreamSetting) -> Self {
        self.stderr = setting;
        self
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    pub fn env(&self) -> &EnvOverlay {
        &self.env
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            link_capacity: self.pipe_capacity,
        }
    }

    /// A handle for `path args...` with this shell's defaults applied.
    pub fn command<I, S>(&self, path: impl Into<String>, args: I) -> ProcessHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProcessHandle::new(path)
            .args(args)
            .stdin(self.stdin)
            .stdout(self.stdout)
            .stderr(self.stderr)
            .env_overlay(self.env.clone())
    }

    pub async fn run<I, S>(&self, path: impl Into<String>, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(path, args).run().await
    }

    /// Run a command and return everything it wrote to stdout.
    ///
    /// On failure the partial output is discarded; use [`Shell::output`] to
    /// keep it.
    pub async fn bytes<I, S>(&self, path: impl Into<String>, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (out, result) = self.output(path, args).await;
        result.map(|()| out)
    }

    /// Run a command and return its stdout together with its result.
    ///
    /// The bytes written before a failure are returned as well.
    pub async fn output<I, S>(&self, path: impl Into<String>, args: I) -> (Vec<u8>, Result<()>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capture = Capture::new();
        let result = self.command(path, args).stdout(capture.clone()).run().await;
        (capture.bytes(), result)
    }

    /// Like [`Shell::bytes`], decoded as UTF-8 (invalid sequences replaced).
    pub async fn string<I, S>(&self, path: impl Into<String>, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bytes = self.bytes(path, args).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn pipe(&self, handles: Vec<ProcessHandle>) -> Result<()> {
        run_pipeline_with(handles, &self.pipeline_options()).await
    }

    pub async fn or(&self, handles: Vec<ProcessHandle>) -> Result<()> {
        run_or(handles).await
    }

    pub async fn and(&self, handles: Vec<ProcessHandle>) -> Result<()> {
        run_and(handles).await
    }
}
