//! Pipeline error types.

use clipforge_models::{InvalidPrompt, OptionsError};
use clipforge_storage::StorageError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors the orchestrator surfaces to its caller.
///
/// Provider, extraction and fetch failures are not errors here; they end in
/// a fallback outcome instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(#[from] InvalidPrompt),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] OptionsError),

    #[error("Failed to persist artifact: {0}")]
    Persist(#[source] StorageError),
}

impl PipelineError {
    /// Whether the caller sent bad input (as opposed to a server-side failure).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidPrompt(_) | PipelineError::InvalidOptions(_)
        )
    }
}
