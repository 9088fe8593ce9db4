//! Generation results.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a request was served the sample artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No provider configured for this deployment
    ProviderUnavailable,
    /// Provider invocation returned an error
    ProviderFailed(String),
    /// Provider did not answer within the timeout (seconds)
    Timeout(u64),
    /// Provider answered with a shape no recognizer accepted
    Extraction(String),
    /// Remote artifact could not be downloaded
    Fetch(String),
}

impl FallbackReason {
    /// Stable label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ProviderUnavailable => "provider_unavailable",
            FallbackReason::ProviderFailed(_) => "provider_failed",
            FallbackReason::Timeout(_) => "timeout",
            FallbackReason::Extraction(_) => "extraction",
            FallbackReason::Fetch(_) => "fetch",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::ProviderUnavailable => write!(f, "provider not configured"),
            FallbackReason::ProviderFailed(msg) => write!(f, "provider failed: {}", msg),
            FallbackReason::Timeout(secs) => write!(f, "provider timed out after {}s", secs),
            FallbackReason::Extraction(msg) => write!(f, "extraction failed: {}", msg),
            FallbackReason::Fetch(msg) => write!(f, "fetch failed: {}", msg),
        }
    }
}

/// How a generation request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Served from the artifact cache
    Cached,
    /// Freshly produced by the provider
    Generated,
    /// Served the local sample artifact
    FallenBack(FallbackReason),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Cached => "cached",
            Outcome::Generated => "generated",
            Outcome::FallenBack(_) => "fallback",
        }
    }
}

/// Result returned by the generation orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Request id the generation was logged under
    pub request_id: String,
    /// Artifact to serve
    pub artifact_path: PathBuf,
    /// Provenance
    pub outcome: Outcome,
    /// Time from request start to terminal state
    pub elapsed: Duration,
}

impl GenerationResult {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, Outcome::FallenBack(_))
    }

    pub fn is_cached(&self) -> bool {
        matches!(self.outcome, Outcome::Cached)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.outcome {
            Outcome::FallenBack(reason) => Some(reason),
            _ => None,
        }
    }
}
