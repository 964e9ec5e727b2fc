//! Pipeline Boundary Error Types

use std::io;
use thiserror::Error;

/// Errors that abort a pipeline invocation.
///
/// Only catastrophic input failures surface here; everything discovered
/// inside a well-formed document becomes a [`crate::ir::Diagnostic`]
/// instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input document is not recognizable JSON of the expected shape
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
