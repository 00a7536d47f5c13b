// src/exec/handle.rs

//! A single external program invocation.

use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::env::EnvOverlay;
use crate::errors::{ProcpipeError, Result};
use crate::exec::stdio::{Input, Output, Sink, StdStream, drain};
use crate::types::Merge;

type SharedSink = Arc<Mutex<Sink>>;

/// Executable path, arguments, I/O endpoints and environment overlay of a
/// process that has not been started yet.
///
/// New handles inherit all three standard streams of the invoking process
/// and its environment.
#[derive(Debug)]
pub struct ProcessHandle {
    path: String,
    args: Vec<String>,
    stdin: Input,
    stdout: Output,
    stderr: Output,
    env: EnvOverlay,
    merge: Option<Merge>,
}

impl ProcessHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            stdin: Input::Inherit,
            stdout: Output::Inherit,
            stderr: Output::Inherit,
            env: EnvOverlay::default(),
            merge: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<Input>) -> Self {
        self.stdin = input.into();
        self
    }

    pub fn stdout(mut self, output: impl Into<Output>) -> Self {
        self.stdout = output.into();
        self
    }

    pub fn stderr(mut self, output: impl Into<Output>) -> Self {
        self.stderr = output.into();
        self
    }

    /// Override a single environment variable for this process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.set(key, value);
        self
    }

    /// Replace the whole environment overlay.
    pub fn env_overlay(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }

    /// Send stderr wherever stdout goes.
    ///
    /// Resolved when the process starts, so inside a pipeline the error
    /// stream of an intermediate stage joins the link to the next stage.
    pub fn combine(mut self) -> Self {
        self.merge = Some(Merge::StderrToStdout);
        self
    }

    /// Send stdout wherever stderr goes.
    pub fn combine_err(mut self) -> Self {
        self.merge = Some(Merge::StdoutToStderr);
        self
    }

    pub fn program(&self) -> &str {
        &self.path
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self) -> &EnvOverlay {
        &self.env
    }

    pub fn get_merge(&self) -> Option<Merge> {
        self.merge
    }

    /// Program and arguments joined by spaces, for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut line = self.path.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    pub(crate) fn replace_stdin(&mut self, input: Input) -> Input {
        std::mem::replace(&mut self.stdin, input)
    }

    pub(crate) fn replace_stdout(&mut self, output: Output) -> Output {
        std::mem::replace(&mut self.stdout, output)
    }

    /// Launch the process and return without waiting for it.
    ///
    /// Must be called from within a Tokio runtime: pumps for in-process
    /// endpoints are spawned as tasks. A launch failure consumes the handle
    /// and releases its endpoints (closing any pipe link it owned).
    pub fn start(self) -> Result<RunningProcess> {
        let ProcessHandle {
            path,
            args,
            stdin,
            stdout,
            stderr,
            env,
            merge,
        } = self;

        let mut cmd = Command::new(&path);
        cmd.args(&args).kill_on_drop(true);
        env.apply(&mut cmd);

        let (stdin_stdio, source) = stdin.into_parts();
        cmd.stdin(stdin_stdio);

        let OutputPlan {
            stdout: stdout_stdio,
            stderr: stderr_stdio,
            stdout_sink,
            stderr_sink,
        } = OutputPlan::new(stdout, stderr, merge);
        cmd.stdout(stdout_stdio).stderr(stderr_stdio);

        let mut child = cmd.spawn().map_err(|source| ProcpipeError::Launch {
            program: path.clone(),
            source,
        })?;

        debug!(program = %path, pid = ?child.id(), ?args, "process started");

        let feeder = match (source, child.stdin.take()) {
            (Some(source), Some(child_stdin)) => Some(tokio::spawn(source.feed(child_stdin))),
            _ => None,
        };

        let mut drains = Vec::new();
        if let (Some(out), Some(sink)) = (child.stdout.take(), stdout_sink.clone()) {
            drains.push(tokio::spawn(drain(out, sink)));
        }
        if let (Some(err), Some(sink)) = (child.stderr.take(), stderr_sink.clone()) {
            drains.push(tokio::spawn(drain(err, sink)));
        }

        Ok(RunningProcess {
            program: path,
            child,
            feeder,
            drains,
            sinks: distinct_sinks(stdout_sink, stderr_sink),
        })
    }

    /// Start the process and wait for it to finish.
    pub async fn run(self) -> Result<()> {
        self.start()?.wait().await
    }
}

/// Stdio configuration plus the sinks pumps write into.
struct OutputPlan {
    stdout: Stdio,
    stderr: Stdio,
    stdout_sink: Option<SharedSink>,
    stderr_sink: Option<SharedSink>,
}

impl OutputPlan {
    fn new(stdout: Output, stderr: Output, merge: Option<Merge>) -> Self {
        match merge {
            None => {
                let (out_stdio, out_sink) = stdout.into_parts(StdStream::Stdout);
                let (err_stdio, err_sink) = stderr.into_parts(StdStream::Stderr);
                Self {
                    stdout: out_stdio,
                    stderr: err_stdio,
                    stdout_sink: out_sink.map(share),
                    stderr_sink: err_sink.map(share),
                }
            }
            Some(Merge::StderrToStdout) => Self::merged(stdout.into_sink(StdStream::Stdout)),
            Some(Merge::StdoutToStderr) => Self::merged(stderr.into_sink(StdStream::Stderr)),
        }
    }

    /// Both streams pumped into one shared sink, or both discarded.
    fn merged(target: Option<Sink>) -> Self {
        match target.map(share) {
            Some(sink) => Self {
                stdout: Stdio::piped(),
                stderr: Stdio::piped(),
                stdout_sink: Some(Arc::clone(&sink)),
                stderr_sink: Some(sink),
            },
            None => Self {
                stdout: Stdio::null(),
                stderr: Stdio::null(),
                stdout_sink: None,
                stderr_sink: None,
            },
        }
    }
}

/// A merged plan shares one sink between both streams; release it once.
fn distinct_sinks(stdout: Option<SharedSink>, stderr: Option<SharedSink>) -> Vec<SharedSink> {
    let mut sinks: Vec<SharedSink> = stdout.into_iter().collect();
    if let Some(err) = stderr {
        if !sinks.iter().any(|s| Arc::ptr_eq(s, &err)) {
            sinks.push(err);
        }
    }
    sinks
}

fn share(sink: Sink) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/// A launched process together with the pumps serving its endpoints.
pub struct RunningProcess {
    program: String,
    child: Child,
    feeder: Option<JoinHandle<io::Result<()>>>,
    drains: Vec<JoinHandle<io::Result<()>>>,
    sinks: Vec<SharedSink>,
}

impl fmt::Debug for RunningProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningProcess")
            .field("program", &self.program)
            .field("child", &self.child)
            .field("pumps", &(self.drains.len() + usize::from(self.feeder.is_some())))
            .finish_non_exhaustive()
    }
}

impl RunningProcess {
    /// OS process id, if the process has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Wait for the process to exit.
    ///
    /// After exit the output pumps are drained completely and the output
    /// endpoints are released, which closes a pipe link write end exactly
    /// once. The input pump is stopped, dropping its read end.
    pub async fn wait(mut self) -> Result<()> {
        let status = self.child.wait().await;

        let mut stream_err: Option<io::Error> = None;

        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
            if let Ok(res) = feeder.await {
                note_stream_result(&self.program, "stdin", res, &mut stream_err);
            }
        }

        for handle in self.drains.drain(..) {
            let res = handle.await.unwrap_or_else(|e| Err(io::Error::other(e)));
            note_stream_result(&self.program, "output", res, &mut stream_err);
        }

        for sink in self.sinks.drain(..) {
            match Arc::try_unwrap(sink) {
                Ok(sink) => {
                    let res = sink.into_inner().release().await;
                    note_stream_result(&self.program, "release", res, &mut stream_err);
                }
                Err(_) => warn!(program = %self.program, "output sink still shared after drain"),
            }
        }

        let status = status.map_err(|source| ProcpipeError::Wait {
            program: self.program.clone(),
            source,
        })?;

        check_status(&self.program, status)?;

        match stream_err {
            Some(source) => Err(ProcpipeError::Stream {
                program: self.program,
                source,
            }),
            None => Ok(()),
        }
    }
}

/// Record the first pump failure. A broken pipe only means the other side
/// went away first, which is normal for pipelines.
fn note_stream_result(
    program: &str,
    what: &str,
    res: io::Result<()>,
    first: &mut Option<io::Error>,
) {
    match res {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(program, stream = what, "peer closed stream early");
        }
        Err(e) => {
            debug!(program, stream = what, error = %e, "stream pump failed");
            if first.is_none() {
                *first = Some(e);
            }
        }
    }
}

fn check_status(program: &str, status: ExitStatus) -> Result<()> {
    let code = status.code();
    info!(
        program,
        exit_code = ?code,
        success = status.success(),
        "process exited"
    );

    if status.success() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(ProcpipeError::Signaled {
                program: program.to_string(),
                signal,
            });
        }
    }

    Err(ProcpipeError::ExitStatus {
        program: program.to_string(),
        code: code.unwrap_or(-1),
    })
}
