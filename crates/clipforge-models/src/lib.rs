//! Shared data models for the clipforge backend.
//!
//! This crate provides:
//! - Prompt normalization (cache keys)
//! - Generation options with default merging
//! - The closed provider response value
//! - Artifact identifiers and container formats
//! - Generation results and outcomes

pub mod artifact;
pub mod options;
pub mod outcome;
pub mod prompt;
pub mod response;

// Re-export common types
pub use artifact::{ArtifactId, VideoFormat};
pub use options::{GenerationOptions, OptionsError};
pub use outcome::{FallbackReason, GenerationResult, Outcome};
pub use prompt::{normalize, InvalidPrompt, NormalizedPrompt, DEFAULT_MAX_PROMPT_CHARS};
pub use response::{ProviderResponse, RemoteLocator, StreamHandle};
