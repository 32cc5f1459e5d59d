//! Executor: external-command dispatch, pipelines, redirections, job
//! control, and signal handling (SPEC_FULL.md §4.4/§5).
//!
//! The simple/compound-command dispatch tree and the pipeline/redirection
//! mechanics already live in [`crate::interpreter`] (`execution_engine`,
//! `pipeline_execution`, `redirections`, `command_resolution`, `jobs`) —
//! this module re-exports that surface as the executor's public API rather
//! than duplicating it, and adds the one piece that had no interpreter-side
//! home: OS signal handling for the interactive main loop.

pub mod signals;

pub use crate::interpreter::command_resolution::resolve_command;
pub use crate::interpreter::execution_engine::ExecutionEngine;
pub use crate::interpreter::jobs::{resolve_job_spec, Job, JobState, JobTable};
pub use crate::interpreter::pipeline_execution::{
    execute_pipeline, PipelineOptions, PipelineResult, PipelineState,
};
pub use crate::interpreter::redirections::apply_redirections;
pub use signals::SignalFlags;
