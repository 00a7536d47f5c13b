// tests/env_overlay.rs

use std::error::Error;

use procpipe::env::var_or;
use procpipe::{Capture, EnvOverlay, Shell};
use procpipe_test_utils::builders::sh;
use procpipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn overlay_wins_over_inherited_values() {
    let overlay = EnvOverlay::new().with("FOO", "overlay");
    let merged = overlay.merged_with([("FOO", "inherited"), ("BAR", "kept")]);

    assert_eq!(merged.get("FOO").map(String::as_str), Some("overlay"));
    assert_eq!(merged.get("BAR").map(String::as_str), Some("kept"));
}

#[test]
fn inherited_value_survives_when_overlay_omits_it() {
    let overlay = EnvOverlay::new().with("OTHER", "x");
    let merged = overlay.merged_with([("FOO", "inherited")]);

    assert_eq!(merged.get("FOO").map(String::as_str), Some("inherited"));
    assert_eq!(merged.len(), 2);
}

#[test]
fn later_set_replaces_earlier_and_extend_layers() {
    let mut base = EnvOverlay::new().with("A", "1").with("B", "1");
    base.set("A", "2");
    let job = EnvOverlay::new().with("B", "job");
    base.extend_from(&job);

    assert_eq!(base.get("A"), Some("2"));
    assert_eq!(base.get("B"), Some("job"));
    assert_eq!(base.remove("A"), Some("2".to_string()));
    assert_eq!(base.get("A"), None);
}

#[test]
fn merged_layers_the_overlay_on_the_process_environment() {
    let overlay = EnvOverlay::new().with("PROCPIPE_TEST_MERGED_ONLY", "overlay");
    let merged = overlay.merged();

    assert_eq!(
        merged.get("PROCPIPE_TEST_MERGED_ONLY").map(String::as_str),
        Some("overlay")
    );
    if let Ok(path) = std::env::var("PATH") {
        assert_eq!(merged.get("PATH"), Some(&path));
    }

    let overridden = EnvOverlay::new().with("PATH", "/procpipe/override").merged();
    assert_eq!(
        overridden.get("PATH").map(String::as_str),
        Some("/procpipe/override")
    );
}

#[test]
fn var_or_falls_back_for_unset_variables() {
    assert_eq!(var_or("PROCPIPE_TEST_SURELY_UNSET_VARIABLE", "fallback"), "fallback");
    if let Ok(path) = std::env::var("PATH") {
        if !path.is_empty() {
            assert_eq!(var_or("PATH", "fallback"), path);
        }
    }
}

#[cfg(unix)]
#[tokio::test]
async fn process_observes_overlay_value() -> TestResult {
    init_tracing();

    // PATH is always inherited; the overlay must win over it.
    let out = Capture::new();
    sh("printf %s \"$PATH\"")
        .env("PATH", "/overlay/bin:/usr/bin:/bin")
        .stdout(out.clone())
        .run()
        .await?;

    assert_eq!(out.string(), "/overlay/bin:/usr/bin:/bin");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn process_observes_inherited_value_when_overlay_omits_it() -> TestResult {
    init_tracing();

    let out = Capture::new();
    sh("printf %s \"$PATH\"")
        .env("PROCPIPE_UNRELATED", "1")
        .stdout(out.clone())
        .run()
        .await?;

    assert_eq!(out.string(), std::env::var("PATH")?);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn shells_with_different_overlays_stay_isolated() -> TestResult {
    init_tracing();

    let red = Shell::new().set_env("COLOR", "red");
    let blue = Shell::new().set_env("COLOR", "blue");

    let script = ["-c", "printf %s \"$COLOR\""];
    let (a, b) = with_timeout(async {
        tokio::join!(red.string("sh", script), blue.string("sh", script))
    })
    .await;

    assert_eq!(a?, "red");
    assert_eq!(b?, "blue");
    assert!(std::env::var("COLOR").map(|v| v != "red" && v != "blue").unwrap_or(true));
    Ok(())
}
