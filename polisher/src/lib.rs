//! Polisher -- iterative consensus refinement of long reads by external tools.
pub mod artifact;
pub mod consensus;
pub mod errors;
pub mod inputs;
pub mod mapper;
pub mod mocks;
pub mod pipeline;
pub mod prepare;
pub mod signal_index;
pub mod tool;

pub use errors::{PolishError, Result};
pub use pipeline::{run_pipeline, run_pipeline_with, PipelineReport};
