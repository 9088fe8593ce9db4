//! Artifact store.
//!
//! Generated videos live in a single directory, one file per artifact,
//! named `<artifact-id>.<ext>`. Files become visible under their final name
//! only once fully written.

use std::path::{Path, PathBuf};

use clipforge_models::{ArtifactId, VideoFormat};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::fs_utils::write_atomic;

/// Directory of generated artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the artifact directory if it does not exist.
    pub async fn ensure_dir(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Persist artifact bytes under a fresh identifier and return the path.
    pub async fn write(&self, data: &[u8], format: VideoFormat) -> StorageResult<PathBuf> {
        let id = ArtifactId::new();
        let path = self.dir.join(id.file_name(format));

        write_atomic(&path, data)
            .await
            .map_err(|e| StorageError::artifact_write(&path, e))?;

        info!(
            artifact_id = %id,
            path = %path.display(),
            size_bytes = data.len(),
            "Stored artifact"
        );
        Ok(path)
    }

    /// Resolve a bare file name inside the store.
    ///
    /// Rejects anything that is not a plain artifact file name, so callers
    /// can pass user-supplied names without risking path traversal.
    pub fn resolve(&self, file_name: &str) -> StorageResult<PathBuf> {
        if !is_valid_artifact_name(file_name) {
            return Err(StorageError::invalid_key(file_name));
        }
        Ok(self.dir.join(file_name))
    }

    /// List artifact file names (known video extensions only), sorted.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_valid_artifact_name(&name) && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        debug!(dir = %self.dir.display(), count = names.len(), "Listed artifacts");
        Ok(names)
    }
}

/// Valid format: non-hidden stem of alphanumerics, hyphens and underscores,
/// followed by a known video extension.
fn is_valid_artifact_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 128 || name.contains("..") {
        return false;
    }
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && VideoFormat::from_extension(ext).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_uses_fresh_names() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("videos"));

        let a = store.write(b"first", VideoFormat::Mp4).await.unwrap();
        let b = store.write(b"first", VideoFormat::Mp4).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(store.dir()));
        assert_eq!(tokio::fs::read(&a).await.unwrap(), b"first");
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("mp4"));
    }

    #[tokio::test]
    async fn test_list_filters_unknown_and_partial_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let written = store.write(b"gif", VideoFormat::Gif).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();
        tokio::fs::write(dir.path().join(".abc.mp4.123.part"), b"x").await.unwrap();

        let names = store.list().await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(
            Some(names[0].as_str()),
            written.file_name().and_then(|n| n.to_str())
        );
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("nope"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, b"file").await.unwrap();
        let store = ArtifactStore::new(&blocker);

        let err = store.write(b"data", VideoFormat::Mp4).await.unwrap_err();
        assert!(matches!(err, StorageError::ArtifactWrite { .. }));
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = ArtifactStore::new("/data/videos");
        assert!(store.resolve("abc123.mp4").is_ok());
        assert!(store.resolve("../cache.json").is_err());
        assert!(store.resolve("sub/abc.mp4").is_err());
        assert!(store.resolve(".hidden.mp4").is_err());
        assert!(store.resolve("abc.txt").is_err());
    }
}
