// tests/combinators.rs
#![cfg(unix)]

use std::error::Error;

use tempfile::TempDir;

use procpipe::errors::ProcpipeError;
use procpipe::{ProcessHandle, run_and, run_or};
use procpipe_test_utils::builders::{fail_with, missing, sh, succeed};
use procpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// A handle that creates `name` inside `dir` when it runs.
fn touch(dir: &TempDir, name: &str) -> ProcessHandle {
    ProcessHandle::new("touch").arg(dir.path().join(name).to_string_lossy().into_owned())
}

#[tokio::test]
async fn or_succeeds_on_first_success() -> TestResult {
    init_tracing();

    with_timeout(run_or(vec![fail_with(1), fail_with(2), succeed()])).await?;
    Ok(())
}

#[tokio::test]
async fn or_skips_everything_after_a_success() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    with_timeout(run_or(vec![fail_with(1), succeed(), touch(&dir, "late")])).await?;

    assert!(!dir.path().join("late").exists(), "handle after success must not run");
    Ok(())
}

#[tokio::test]
async fn or_reports_none_succeeded_when_all_fail() -> TestResult {
    init_tracing();

    let result = with_timeout(run_or(vec![fail_with(1), missing()])).await;
    assert!(matches!(result, Err(ProcpipeError::NoneSucceeded)), "got {result:?}");
    Ok(())
}

#[tokio::test]
async fn or_with_no_handles_reports_none_succeeded() -> TestResult {
    init_tracing();

    let result = with_timeout(run_or(Vec::new())).await;
    assert!(matches!(result, Err(ProcpipeError::NoneSucceeded)));
    Ok(())
}

#[tokio::test]
async fn and_returns_first_error_and_stops() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let handles = vec![touch(&dir, "first"), fail_with(4), touch(&dir, "third")];

    match with_timeout(run_and(handles)).await {
        Err(ProcpipeError::ExitStatus { code, .. }) => assert_eq!(code, 4),
        other => panic!("expected exit status 4, got {other:?}"),
    }

    assert!(dir.path().join("first").exists());
    assert!(!dir.path().join("third").exists(), "third handle must never start");
    Ok(())
}

#[tokio::test]
async fn and_succeeds_when_everything_succeeds() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    with_timeout(run_and(vec![touch(&dir, "a"), succeed(), touch(&dir, "b")])).await?;

    assert!(dir.path().join("a").exists());
    assert!(dir.path().join("b").exists());
    Ok(())
}

#[tokio::test]
async fn and_with_no_handles_succeeds() -> TestResult {
    init_tracing();

    with_timeout(run_and(Vec::new())).await?;
    Ok(())
}

#[tokio::test]
async fn and_runs_strictly_in_order() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let log = dir.path().join("log");

    // Earlier steps sleep longer, so any overlap would reorder the log.
    let handles = (1..=3)
        .map(|i| {
            sh(&format!(
                "sleep 0.0{}; echo {i} >> '{}'",
                4 - i,
                log.display()
            ))
        })
        .collect();
    with_timeout(run_and(handles)).await?;

    assert_eq!(std::fs::read_to_string(&log)?, "1\n2\n3\n");
    Ok(())
}
