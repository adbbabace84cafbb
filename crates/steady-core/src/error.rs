//! Error types for Steady.

use thiserror::Error;

/// Main error type for stabilization operations.
#[derive(Error, Debug)]
pub enum SteadyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open input: {0}")]
    Open(String),

    #[error("input yielded no decodable frames: {0}")]
    FirstFrame(String),

    #[error("encoder error: {0}")]
    Encode(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for stabilization operations.
pub type Result<T> = std::result::Result<T, SteadyError>;
