pub mod analytics;
pub mod cli;
pub mod document;
pub mod error;
pub mod generator;
pub mod locator;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod settings;
pub mod validation;

pub use cli::Args;
pub use error::{FailureKind, PipelineError, Result};
pub use pipeline::{ExecutionOutcome, Pipeline};
pub use reporter::Reporter;
