//! Atomic filesystem helpers.
//!
//! Everything the pipeline publishes (artifacts, the cache index, session
//! documents) is first written to a temporary sibling and then renamed into
//! place, so readers never observe a partially written file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Suffix used for in-progress files.
pub const PART_SUFFIX: &str = "part";

/// Temporary sibling path for `dst`, unique per call.
///
/// Hidden (dot-prefixed) and suffixed with `.part` so directory listings
/// that filter by extension never pick it up.
pub fn temp_sibling(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_name = format!(".{}.{}.{}", name, Uuid::new_v4().simple(), PART_SUFFIX);
    dst.with_file_name(tmp_name)
}

/// Write `data` to `dst` atomically.
///
/// The bytes are written and synced to a temporary sibling which is then
/// renamed over `dst`. On failure the temporary file is removed and `dst`
/// is left untouched.
pub async fn write_atomic(dst: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_sibling(dst);
    if let Err(e) = write_and_sync(&tmp, data).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, dst).await {
        let _ = fs::remove_file(&tmp).await;
        tracing::error!(
            "Failed to publish {} -> {}: {}",
            tmp.display(),
            dst.display(),
            e
        );
        return Err(e);
    }

    Ok(())
}

async fn write_and_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("nested").join("out.bin");

        write_atomic(&dst, b"payload").await.unwrap();

        assert_eq!(fs::read(&dst).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let dst = dir.path().join("index.json");

        write_atomic(&dst, b"{}").await.unwrap();
        write_atomic(&dst, b"{\"a\":1}").await.unwrap();

        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["index.json".to_string()]);
        assert_eq!(fs::read_to_string(&dst).await.unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_temp_sibling_is_hidden_part_file() {
        let tmp = temp_sibling(Path::new("/data/videos/abc.mp4"));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".abc.mp4."));
        assert!(name.ends_with(".part"));
        assert_eq!(tmp.parent(), Some(Path::new("/data/videos")));
    }
}
