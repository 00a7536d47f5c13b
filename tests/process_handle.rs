// tests/process_handle.rs
#![cfg(unix)]

use std::error::Error;
use std::io::Read;

use tempfile::NamedTempFile;

use procpipe::errors::ProcpipeError;
use procpipe::{Capture, Input, Output, ProcessHandle};
use procpipe_test_utils::builders::{missing, sh};
use procpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn start_reports_missing_executable_as_launch_failure() -> TestResult {
    init_tracing();

    match missing().start() {
        Err(ProcpipeError::Launch { program, source }) => {
            assert_eq!(program, "procpipe-test-no-such-binary");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected launch failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn start_returns_before_the_process_finishes() -> TestResult {
    init_tracing();

    let out = Capture::new();
    let running = sh("sleep 0.2; echo done").stdout(out.clone()).start()?;
    assert!(running.id().is_some());
    assert!(out.is_empty(), "output must not be there before waiting");

    with_timeout(running.wait()).await?;
    assert_eq!(out.string(), "done\n");
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_is_reported_from_wait() -> TestResult {
    init_tracing();

    let running = sh("exit 42").start()?;
    match with_timeout(running.wait()).await {
        Err(ProcpipeError::ExitStatus { program, code }) => {
            assert_eq!(program, "sh");
            assert_eq!(code, 42);
        }
        other => panic!("expected exit status 42, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn signal_termination_is_reported() -> TestResult {
    init_tracing();

    match with_timeout(sh("kill -9 $$").run()).await {
        Err(err @ ProcpipeError::Signaled { .. }) => {
            assert!(matches!(err, ProcpipeError::Signaled { signal: 9, .. }));
            assert_eq!(err.exit_code(), 137);
        }
        other => panic!("expected signal termination, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn bytes_input_is_followed_by_end_of_stream() -> TestResult {
    init_tracing();

    let out = Capture::new();
    ProcessHandle::new("wc")
        .arg("-c")
        .stdin(Input::bytes("12345"))
        .stdout(out.clone())
        .run()
        .await?;

    assert_eq!(out.string().trim(), "5");
    Ok(())
}

#[tokio::test]
async fn reader_input_and_writer_output_are_pumped() -> TestResult {
    init_tracing();

    let (client, mut server) = tokio::io::duplex(64);
    let handle = ProcessHandle::new("tr")
        .args(["a-z", "A-Z"])
        .stdin(Input::reader(&b"streamed"[..]))
        .stdout(Output::writer(client));

    with_timeout(handle.run()).await?;

    // `run` drops the client end, so the server side reaches EOF.
    let mut received = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut server, &mut received).await?;
    assert_eq!(received, b"STREAMED");
    Ok(())
}

#[tokio::test]
async fn file_endpoints_are_passed_to_the_child() -> TestResult {
    init_tracing();

    let mut input = NamedTempFile::new()?;
    std::io::Write::write_all(&mut input, b"from file")?;
    let mut output = NamedTempFile::new()?;

    ProcessHandle::new("cat")
        .stdin(Input::File(std::fs::File::open(input.path())?))
        .stdout(Output::File(output.reopen()?))
        .run()
        .await?;

    let mut contents = String::new();
    output.as_file_mut().read_to_string(&mut contents)?;
    assert_eq!(contents, "from file");
    Ok(())
}

#[tokio::test]
async fn combine_sends_stderr_to_stdout_target() -> TestResult {
    init_tracing();

    let out = Capture::new();
    let err = Capture::new();
    sh("echo one; echo two >&2")
        .stdout(out.clone())
        .stderr(err.clone())
        .combine()
        .run()
        .await?;

    let mut lines: Vec<String> = out.string().lines().map(str::to_string).collect();
    lines.sort();
    assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    assert!(err.is_empty());
    Ok(())
}

#[tokio::test]
async fn combine_err_sends_stdout_to_stderr_target() -> TestResult {
    init_tracing();

    let out = Capture::new();
    let err = Capture::new();
    sh("echo one")
        .stdout(out.clone())
        .stderr(err.clone())
        .combine_err()
        .run()
        .await?;

    assert!(out.is_empty());
    assert_eq!(err.string(), "one\n");
    Ok(())
}

#[tokio::test]
async fn combine_into_null_discards_both_streams() -> TestResult {
    init_tracing();

    sh("echo one; echo two >&2")
        .stdout(Output::Null)
        .combine()
        .run()
        .await?;
    Ok(())
}

#[test]
fn command_line_joins_program_and_args() {
    let handle = ProcessHandle::new("tr").args(["a-z", "A-Z"]);
    assert_eq!(handle.command_line(), "tr a-z A-Z");
    assert_eq!(handle.program(), "tr");
    assert_eq!(handle.get_args(), ["a-z".to_string(), "A-Z".to_string()]);
}
