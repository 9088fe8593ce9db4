//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cache index write failed for {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact write failed for {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWrite {
            path: path.into(),
            source,
        }
    }

    pub fn artifact_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArtifactWrite {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// True when the failure concerned only the cache index.
    pub fn is_cache_write(&self) -> bool {
        matches!(self, StorageError::CacheWrite { .. })
    }
}
