// tests/logging_level.rs

use procpipe::cli::LogLevel;
use procpipe::logging::{parse_level_str, resolve_level};
use tracing::Level;

#[test]
fn default_level_is_info() {
    assert_eq!(resolve_level(None, None), Level::INFO);
    assert_eq!(resolve_level(None, Some("chatty")), Level::INFO);
}

#[test]
fn env_value_is_used_without_a_flag() {
    assert_eq!(resolve_level(None, Some(" Debug ")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), Level::WARN);
}

#[test]
fn cli_flag_beats_env_value() {
    assert_eq!(resolve_level(Some(LogLevel::Error), Some("trace")), Level::ERROR);
}

#[test]
fn unknown_level_names_are_rejected() {
    assert_eq!(parse_level_str("loud"), None);
    assert_eq!(parse_level_str("TRACE"), Some(Level::TRACE));
}
