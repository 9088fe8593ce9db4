//! Prompt normalization.
//!
//! A normalized prompt is the cache key for generated artifacts. It is never
//! sent to the provider; the raw prompt is.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default ceiling on prompt length, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 2000;

/// Rejected prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidPrompt {
    #[error("prompt is empty")]
    Empty,

    #[error("prompt is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },
}

/// Canonical form of a prompt: trimmed, whitespace-collapsed, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPrompt(String);

impl NormalizedPrompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NormalizedPrompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw prompt into a cache key.
///
/// Fails if the prompt is empty after trimming or longer than `max_chars`.
/// The length check runs on the trimmed text so that surrounding padding
/// never pushes an otherwise valid prompt over the limit.
pub fn normalize(raw: &str, max_chars: usize) -> Result<NormalizedPrompt, InvalidPrompt> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidPrompt::Empty);
    }

    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(InvalidPrompt::TooLong { len, max: max_chars });
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(NormalizedPrompt(collapsed.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let a = normalize("  A Calm Forest  ", DEFAULT_MAX_PROMPT_CHARS).unwrap();
        let b = normalize("a calm forest", DEFAULT_MAX_PROMPT_CHARS).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "a calm forest");
    }

    #[test]
    fn test_collapses_internal_runs() {
        let p = normalize("sunset\t\tover \n  mountains", DEFAULT_MAX_PROMPT_CHARS).unwrap();
        assert_eq!(p.as_str(), "sunset over mountains");
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["  Hello   World ", "ÄBC  déf", "x", "Multi\nLine\r\nPrompt"];
        for input in inputs {
            let once = normalize(input, DEFAULT_MAX_PROMPT_CHARS).unwrap();
            let twice = normalize(once.as_str(), DEFAULT_MAX_PROMPT_CHARS).unwrap();
            assert_eq!(once, twice, "normalization of {input:?} is not idempotent");
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(normalize("", 10), Err(InvalidPrompt::Empty));
        assert_eq!(normalize("   \n\t ", 10), Err(InvalidPrompt::Empty));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(11);
        assert_eq!(
            normalize(&long, 10),
            Err(InvalidPrompt::TooLong { len: 11, max: 10 })
        );
    }

    #[test]
    fn test_limit_counts_trimmed_chars() {
        let padded = format!("   {}   ", "é".repeat(10));
        assert!(normalize(&padded, 10).is_ok());
    }
}
