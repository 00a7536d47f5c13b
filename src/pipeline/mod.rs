// src/pipeline/mod.rs

//! Ways of running several processes together.
//!
//! - [`coordinator`]: concurrent pipelines where each stage's stdout feeds
//!   the next stage's stdin; only the last stage's result is reported.
//! - [`combinators`]: sequential `or` / `and` chains with short-circuiting.

pub mod combinators;
pub mod coordinator;

pub use combinators::{run_and, run_or};
pub use coordinator::{PipelineOptions, StageStatus, run_pipeline, run_pipeline_with};
