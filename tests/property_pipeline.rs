// tests/property_pipeline.rs
#![cfg(unix)]

use proptest::prelude::*;

use procpipe::errors::ProcpipeError;
use procpipe::{ProcessHandle, run_and, run_or, run_pipeline};
use procpipe_test_utils::builders::{fail_with, succeed};

/// Build one handle per entry: `0` succeeds, anything else exits with that code.
fn handles_for(codes: &[i32]) -> Vec<ProcessHandle> {
    codes
        .iter()
        .map(|&code| if code == 0 { succeed() } else { fail_with(code) })
        .collect()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("building test runtime")
        .block_on(f)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn pipeline_result_is_the_terminal_stage_result(
        codes in proptest::collection::vec(prop_oneof![3 => Just(0i32), 1 => 1..5i32], 0..6)
    ) {
        let result = block_on(run_pipeline(handles_for(&codes)));

        match codes.last() {
            None | Some(0) => prop_assert!(result.is_ok(), "got {:?}", result),
            Some(&code) => prop_assert!(
                matches!(result, Err(ProcpipeError::ExitStatus { code: c, .. }) if c == code),
                "expected exit {}, got {:?}", code, result
            ),
        }
    }

    #[test]
    fn or_succeeds_iff_any_handle_succeeds(
        codes in proptest::collection::vec(prop_oneof![1 => Just(0i32), 2 => 1..5i32], 0..5)
    ) {
        let result = block_on(run_or(handles_for(&codes)));

        if codes.contains(&0) {
            prop_assert!(result.is_ok(), "got {:?}", result);
        } else {
            prop_assert!(matches!(result, Err(ProcpipeError::NoneSucceeded)), "got {:?}", result);
        }
    }

    #[test]
    fn and_fails_with_the_first_failure(
        codes in proptest::collection::vec(prop_oneof![3 => Just(0i32), 1 => 1..5i32], 0..5)
    ) {
        let result = block_on(run_and(handles_for(&codes)));

        match codes.iter().find(|&&c| c != 0) {
            None => prop_assert!(result.is_ok(), "got {:?}", result),
            Some(&code) => prop_assert!(
                matches!(result, Err(ProcpipeError::ExitStatus { code: c, .. }) if c == code),
                "expected exit {}, got {:?}", code, result
            ),
        }
    }
}
