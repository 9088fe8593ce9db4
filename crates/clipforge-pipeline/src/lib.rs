//! Prompt-to-video generation pipeline.
//!
//! This crate provides:
//! - Output extraction from heterogeneous provider responses
//! - The generation orchestrator (cache, provider, fallback)
//! - Per-key single-flight locking
//! - Generation logging and metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod single_flight;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use extract::{extract, ExtractError, Extracted};
pub use generator::Generator;
pub use logging::GenerationLogger;
pub use single_flight::KeyedLocks;
