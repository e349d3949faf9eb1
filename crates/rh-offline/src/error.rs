//! Error types for offline rendering

use rh_core::CoreError;
use thiserror::Error;

/// Offline rendering errors
#[derive(Error, Debug)]
pub enum OfflineError {
    /// The rendering backend cannot be constructed for this input
    #[error("Rendering engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single stage failed; the pipeline bypasses it
    #[error("Stage '{stage}' failed: {reason}")]
    Stage { stage: &'static str, reason: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl OfflineError {
    /// Wrap a failure inside the named stage
    pub fn stage(stage: &'static str, reason: impl ToString) -> Self {
        Self::Stage {
            stage,
            reason: reason.to_string(),
        }
    }

    /// True for failures that abort the whole call
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::InvalidInput(_))
    }
}

/// Result type for offline operations
pub type OfflineResult<T> = Result<T, OfflineError>;
