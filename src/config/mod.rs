// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] mirrors the TOML layout with `serde`.
//! - [`loader`] reads files and turns them into a validated [`ConfigFile`].
//! - [`validate`] holds the semantic checks behind `TryFrom<RawConfigFile>`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, ConfigSection, JobConfig, RawConfigFile, StageConfig};
