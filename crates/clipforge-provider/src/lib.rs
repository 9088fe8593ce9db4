//! Generation provider plumbing.
//!
//! This crate provides:
//! - The `ProviderClient` seam the pipeline invokes
//! - A Replicate predictions API client
//! - The `ArtifactFetcher` that downloads remote artifacts
//! - Retry with exponential backoff for transient HTTP failures

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod replicate;
pub mod retry;

pub use client::{ArtifactFetcher, ProviderClient};
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use fetch::HttpFetcher;
pub use replicate::ReplicateClient;
pub use retry::{with_retry, RetryConfig};
