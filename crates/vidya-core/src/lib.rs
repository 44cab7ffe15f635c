//! Lesson plan generation: agentic curriculum search followed by
//! schema-constrained plan synthesis.

pub mod config;
pub mod pipeline;
pub mod plan;
pub mod provider;
pub mod search;
pub mod text;

pub use pipeline::{Pipeline, PipelineError};
