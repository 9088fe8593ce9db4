//! Session history.
//!
//! Each session is one pretty-printed JSON document under the sessions
//! directory, `<session_id>.json`, holding the ordered message log. Writes go
//! through a temp file and rename; appends to the same session are serialized.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clipforge_pipeline::KeyedLocks;
use clipforge_storage::fs_utils::write_atomic;
use clipforge_storage::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Messages of history included in a brief.
pub const BRIEF_HISTORY_MESSAGES: usize = 6;

/// Maximum brief length in characters before truncation.
pub const MAX_BRIEF_CHARS: usize = 600;

/// Maximum session id length.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// One entry in a session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: String,
    pub text: String,
    #[serde(default)]
    pub meta: Map<String, Value>,
    pub ts: String,
}

/// A conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub messages: Vec<SessionMessage>,
}

impl Session {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now().to_rfc3339(),
            messages: Vec::new(),
        }
    }
}

/// File-backed session store.
pub struct SessionStore {
    dir: PathBuf,
    locks: KeyedLocks<String>,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: KeyedLocks::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Valid format: 1-64 characters of ASCII alphanumerics, `-` and `_`.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= MAX_SESSION_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn path_for(&self, id: &str) -> StorageResult<PathBuf> {
        if !Self::is_valid_id(id) {
            return Err(StorageError::invalid_key(format!("invalid session id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Create a session with a fresh id.
    pub async fn create(&self) -> StorageResult<Session> {
        let session = Session::new(Uuid::new_v4().simple().to_string());
        self.write(&session).await?;
        debug!(session_id = %session.id, "Created session");
        Ok(session)
    }

    /// Load a session, creating it under `id` if it does not exist.
    pub async fn ensure(&self, id: &str) -> StorageResult<Session> {
        let path = self.path_for(id)?;
        let _guard = self.locks.acquire(id.to_string()).await;
        self.load_or_new(id, &path).await
    }

    /// Load a session. `Ok(None)` when it does not exist.
    pub async fn load(&self, id: &str) -> StorageResult<Option<Session>> {
        let path = self.path_for(id)?;
        read_session(&path).await
    }

    /// Append a message, creating the session if needed. Returns the
    /// updated session.
    pub async fn append_message(
        &self,
        id: &str,
        role: &str,
        text: &str,
        meta: Map<String, Value>,
    ) -> StorageResult<Session> {
        let path = self.path_for(id)?;
        let _guard = self.locks.acquire(id.to_string()).await;

        let mut session = match read_session(&path).await? {
            Some(session) => session,
            None => {
                warn!(session_id = %id, "Appending to unknown session, creating it");
                Session::new(id)
            }
        };
        session.messages.push(SessionMessage {
            role: role.to_string(),
            text: text.to_string(),
            meta,
            ts: Utc::now().to_rfc3339(),
        });
        self.write(&session).await?;
        Ok(session)
    }

    async fn load_or_new(&self, id: &str, path: &Path) -> StorageResult<Session> {
        if let Some(session) = read_session(path).await? {
            return Ok(session);
        }
        let session = Session::new(id);
        self.write(&session).await?;
        debug!(session_id = %id, "Created session with caller-supplied id");
        Ok(session)
    }

    async fn write(&self, session: &Session) -> StorageResult<()> {
        let path = self.path_for(&session.id)?;
        let json = serde_json::to_vec_pretty(session)?;
        write_atomic(&path, &json).await?;
        Ok(())
    }
}

async fn read_session(path: &Path) -> StorageResult<Option<Session>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Build the production brief for a prompt from recent session history.
///
/// The brief is the trimmed prompt, followed by the last
/// [`BRIEF_HISTORY_MESSAGES`] messages as `role: text` when there are any,
/// capped at [`MAX_BRIEF_CHARS`] characters.
pub fn build_brief(history: &[SessionMessage], prompt: &str) -> String {
    let mut brief = prompt.trim().to_string();

    let start = history.len().saturating_sub(BRIEF_HISTORY_MESSAGES);
    let recent = &history[start..];
    if !recent.is_empty() {
        let context = recent
            .iter()
            .map(|m| format!("{}: {}", m.role, m.text))
            .collect::<Vec<_>>()
            .join(" | ");
        brief.push_str(" — Context: ");
        brief.push_str(&context);
    }

    match brief.char_indices().nth(MAX_BRIEF_CHARS) {
        Some((idx, _)) => format!("{}...", &brief[..idx]),
        None => brief,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn message(role: &str, text: &str) -> SessionMessage {
        SessionMessage {
            role: role.to_string(),
            text: text.to_string(),
            meta: Map::new(),
            ts: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_session_id_validation() {
        assert!(SessionStore::is_valid_id("abc123"));
        assert!(SessionStore::is_valid_id("user_session-01"));
        assert!(!SessionStore::is_valid_id(""));
        assert!(!SessionStore::is_valid_id("../etc/passwd"));
        assert!(!SessionStore::is_valid_id("a.json"));
        assert!(!SessionStore::is_valid_id(&"a".repeat(65)));
    }

    #[test]
    fn test_brief_without_history() {
        assert_eq!(build_brief(&[], "  a calm forest  "), "a calm forest");
    }

    #[test]
    fn test_brief_uses_last_six_messages() {
        let history: Vec<_> = (0..8).map(|i| message("user", &format!("m{i}"))).collect();
        let brief = build_brief(&history, "sunset");
        assert_eq!(
            brief,
            "sunset — Context: user: m2 | user: m3 | user: m4 | user: m5 | user: m6 | user: m7"
        );
    }

    #[test]
    fn test_brief_is_truncated() {
        let brief = build_brief(&[message("user", &"x".repeat(1000))], "prompt");
        assert_eq!(brief.chars().count(), MAX_BRIEF_CHARS + 3);
        assert!(brief.ends_with("..."));
    }

    #[tokio::test]
    async fn test_create_load_and_append() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let session = store.create().await.unwrap();
        assert_eq!(session.id.len(), 32);
        assert!(dir.path().join(format!("{}.json", session.id)).exists());

        let mut meta = Map::new();
        meta.insert("source".to_string(), Value::from("test"));
        store
            .append_message(&session.id, "user", "hello", meta)
            .await
            .unwrap();

        let loaded = store.load(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].text, "hello");
        assert_eq!(loaded.messages[0].meta["source"], "test");
    }

    #[tokio::test]
    async fn test_ensure_keeps_existing_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        store.ensure("custom-id").await.unwrap();
        store
            .append_message("custom-id", "user", "first", Map::new())
            .await
            .unwrap();
        let again = store.ensure("custom-id").await.unwrap();
        assert_eq!(again.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_sessions() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        assert!(store.load("missing").await.unwrap().is_none());
        assert!(matches!(
            store.load("../cache").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store
            .append_message("bad/id", "user", "x", Map::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(SessionStore::new(dir.path()));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_message("shared", "user", &format!("msg {i}"), Map::new())
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.load("shared").await.unwrap().unwrap();
        assert_eq!(session.messages.len(), 16);
    }
}
