//! Error types for ReHype

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("DSP error: {0}")]
    Dsp(String),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
