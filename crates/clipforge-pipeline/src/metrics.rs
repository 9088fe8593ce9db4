//! Generation metrics.
//!
//! Provides standardized metrics for monitoring the pipeline:
//! - Generation counters by outcome
//! - Generation latency histograms
//! - Fallback counters by reason

use std::time::Duration;

use clipforge_models::{FallbackReason, Outcome};
use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total generation requests by outcome.
    pub const GENERATIONS_TOTAL: &str = "clipforge_generations_total";

    /// End-to-end generation latency in seconds by outcome.
    pub const GENERATION_SECONDS: &str = "clipforge_generation_seconds";

    /// Fallbacks by reason.
    pub const FALLBACKS_TOTAL: &str = "clipforge_fallbacks_total";

    /// Cache index write failures.
    pub const CACHE_WRITE_FAILURES_TOTAL: &str = "clipforge_cache_write_failures_total";
}

/// Record a finished generation.
pub fn record_generation(outcome: &Outcome, elapsed: Duration) {
    counter!(
        names::GENERATIONS_TOTAL,
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        names::GENERATION_SECONDS,
        "outcome" => outcome.as_str()
    )
    .record(elapsed.as_secs_f64());

    if let Outcome::FallenBack(reason) = outcome {
        record_fallback(reason);
    }
}

fn record_fallback(reason: &FallbackReason) {
    counter!(
        names::FALLBACKS_TOTAL,
        "reason" => reason.as_str()
    )
    .increment(1);
}

/// Record a failed cache index write.
pub fn record_cache_write_failure() {
    counter!(names::CACHE_WRITE_FAILURES_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::GENERATIONS_TOTAL.starts_with("clipforge_"));
        assert!(names::GENERATION_SECONDS.ends_with("_seconds"));
        assert!(names::FALLBACKS_TOTAL.contains("fallbacks"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_generation(
            &Outcome::FallenBack(FallbackReason::ProviderUnavailable),
            Duration::from_millis(3),
        );
        record_cache_write_failure();
    }
}
