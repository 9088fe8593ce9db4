//! Artifact cache index.
//!
//! Maps normalized prompts to artifact paths. The in-memory map is the
//! source of truth for lookups; the on-disk index is a flushed snapshot of
//! it, written atomically, so a crash mid-flush never leaves a torn index.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clipforge_models::NormalizedPrompt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::fs_utils::write_atomic;

/// Prompt → artifact index shared by all in-flight requests.
///
/// Implementations must make a completed `store` visible to every later
/// `lookup` in the same process, even before the flush finishes.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Find the artifact produced for a normalized prompt.
    async fn lookup(&self, key: &NormalizedPrompt) -> Option<PathBuf>;

    /// Record an artifact for a prompt and persist the index.
    ///
    /// The entry stays visible in memory even when persisting fails; the
    /// error is reported as [`StorageError::CacheWrite`].
    async fn store(&self, key: NormalizedPrompt, path: PathBuf) -> StorageResult<()>;

    /// Read the persisted index. Idempotent; a missing, empty or corrupt
    /// index is treated as empty.
    async fn load(&self) -> StorageResult<()>;

    /// Persist the index atomically.
    async fn flush(&self) -> StorageResult<()>;

    /// Number of entries currently held.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Cache index persisted as a flat JSON object (`{"prompt": "path"}`).
pub struct FileArtifactCache {
    index_path: PathBuf,
    entries: RwLock<HashMap<NormalizedPrompt, PathBuf>>,
    /// Serializes flushes against each other; lookups never take it.
    flush_lock: Mutex<()>,
}

impl FileArtifactCache {
    /// Create an empty cache backed by `index_path`. Call [`ArtifactCache::load`]
    /// to read existing entries.
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            entries: RwLock::new(HashMap::new()),
            flush_lock: Mutex::new(()),
        }
    }

    /// Create and load in one step.
    pub async fn open(index_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let cache = Self::new(index_path);
        cache.load().await?;
        Ok(cache)
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    async fn read_index(&self) -> StorageResult<BTreeMap<NormalizedPrompt, PathBuf>> {
        let raw = match tokio::fs::read(&self.index_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.index_path.display(), "No cache index yet, starting empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        // Undecodable bytes and invalid JSON alike start an empty index.
        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(
                    path = %self.index_path.display(),
                    error = %e,
                    "Cache index is corrupt, starting fresh"
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

#[async_trait]
impl ArtifactCache for FileArtifactCache {
    async fn lookup(&self, key: &NormalizedPrompt) -> Option<PathBuf> {
        self.entries.read().await.get(key).cloned()
    }

    async fn store(&self, key: NormalizedPrompt, path: PathBuf) -> StorageResult<()> {
        debug!(key = %key, path = %path.display(), "Storing cache entry");
        self.entries.write().await.insert(key, path);
        self.flush().await
    }

    async fn load(&self) -> StorageResult<()> {
        let on_disk = self.read_index().await?;
        let loaded = on_disk.len();

        let mut entries = self.entries.write().await;
        for (key, path) in on_disk {
            // Entries stored in this process are newer than anything on disk.
            entries.entry(key).or_insert(path);
        }

        info!(
            path = %self.index_path.display(),
            loaded = loaded,
            total = entries.len(),
            "Loaded cache index"
        );
        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        let _guard = self.flush_lock.lock().await;

        // Snapshot under the read lock only; serialization and IO happen
        // without holding it so lookups proceed during the write.
        let snapshot: BTreeMap<NormalizedPrompt, PathBuf> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let json = serde_json::to_vec_pretty(&snapshot)?;
        write_atomic(&self.index_path, &json)
            .await
            .map_err(|e| StorageError::cache_write(&self.index_path, e))?;

        debug!(
            path = %self.index_path.display(),
            entries = snapshot.len(),
            "Flushed cache index"
        );
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Cache index that lives only in memory.
#[derive(Default)]
pub struct MemoryArtifactCache {
    entries: RwLock<HashMap<NormalizedPrompt, PathBuf>>,
}

impl MemoryArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactCache for MemoryArtifactCache {
    async fn lookup(&self, key: &NormalizedPrompt) -> Option<PathBuf> {
        self.entries.read().await.get(key).cloned()
    }

    async fn store(&self, key: NormalizedPrompt, path: PathBuf) -> StorageResult<()> {
        self.entries.write().await.insert(key, path);
        Ok(())
    }

    async fn load(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
