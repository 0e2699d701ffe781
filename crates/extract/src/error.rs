#![forbid(unsafe_code)]

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("unsupported document type: {0:?}")]
    Unsupported(String),
    #[error("{program} not found")]
    MissingProgram { program: String },
    #[error("{program} timed out after {:?}", timeout)]
    Timeout { program: String, timeout: Duration },
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}
