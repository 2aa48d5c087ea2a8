//! On-disk session store
//!
//! Layout: `<root>/<session_id>/header.json` and `<root>/<session_id>/state.json`.
//! Both files are replaced whole on every write.

use super::types::{SessionHeader, SessionState};
use crate::config::app_dir;
use crate::error::{ParleyError, ParleyResult};
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

const HEADER_FILE: &str = "header.json";
const STATE_FILE: &str = "state.json";

/// Reject ids that would escape the session root
pub fn validate_session_id(id: &str) -> ParleyResult<()> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        return Err(ParleyError::invalid_input_field(
            format!("Invalid session id: {:?}", id),
            "session_id",
        ));
    }
    Ok(())
}

pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under `~/.config/parley/sessions`
    pub fn default_location() -> ParleyResult<Self> {
        Ok(Self::new(app_dir()?.join("sessions")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, id: &str) -> ParleyResult<PathBuf> {
        validate_session_id(id)?;
        Ok(self.root.join(id))
    }

    pub fn state_path(&self, id: &str) -> ParleyResult<PathBuf> {
        Ok(self.session_dir(id)?.join(STATE_FILE))
    }

    pub fn header_path(&self, id: &str) -> ParleyResult<PathBuf> {
        Ok(self.session_dir(id)?.join(HEADER_FILE))
    }

    /// Load a session. A session without a header is new and returned fresh
    /// without touching the disk.
    #[instrument(skip(self), level = "debug")]
    pub async fn load(&self, id: &str) -> ParleyResult<SessionState> {
        let header_path = self.header_path(id)?;
        match fs::metadata(&header_path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored session {}, starting fresh", id);
                return Ok(SessionState::new(id));
            }
            Err(e) => {
                return Err(ParleyError::io_at(
                    format!("Failed to read session header: {}", e),
                    &header_path,
                ));
            }
        }

        let state_path = self.state_path(id)?;
        let json = fs::read_to_string(&state_path).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to read session state: {}", e), &state_path)
        })?;
        let state: SessionState = serde_json::from_str(&json).map_err(|e| ParleyError::Json {
            message: format!("Failed to parse session state: {}", e),
            context: Some(state_path.display().to_string()),
        })?;

        debug!("Loaded session {} ({} entries)", id, state.history.len());
        Ok(state)
    }

    /// Stamp `updated_at` and write header then state
    #[instrument(skip(self, state), fields(session_id = %state.id()), level = "debug")]
    pub async fn store(&self, state: &mut SessionState) -> ParleyResult<()> {
        state.header.updated_at = Utc::now();
        let dir = self.session_dir(state.id())?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to create session directory: {}", e), &dir)
        })?;

        let header = serde_json::to_string_pretty(&state.header)?;
        let body = serde_json::to_string_pretty(state)?;

        let header_path = dir.join(HEADER_FILE);
        fs::write(&header_path, header).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to write session header: {}", e), &header_path)
        })?;
        let state_path = dir.join(STATE_FILE);
        fs::write(&state_path, body).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to write session state: {}", e), &state_path)
        })?;

        debug!("Stored session {} to {:?}", state.id(), dir);
        Ok(())
    }

    /// Headers of all stored sessions, newest first. Unreadable headers are skipped.
    pub async fn list(&self) -> ParleyResult<Vec<SessionHeader>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ParleyError::io_at(
                    format!("Failed to list sessions: {}", e),
                    &self.root,
                ));
            }
        };

        let mut headers = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let path = entry.path().join(HEADER_FILE);
            let parsed = match fs::read_to_string(&path).await {
                Ok(json) => serde_json::from_str::<SessionHeader>(&json).map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            match parsed {
                Ok(header) => headers.push(header),
                Err(e) => warn!("Skipping session {:?}: failed to read header: {}", entry.file_name(), e),
            }
        }

        headers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(headers)
    }

    /// Whether a session directory exists
    pub async fn exists(&self, id: &str) -> ParleyResult<bool> {
        let dir = self.session_dir(id)?;
        fs::try_exists(&dir).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to check session directory: {}", e), &dir)
        })
    }

    /// Remove a session directory. Returns false when there was nothing to delete.
    pub async fn delete(&self, id: &str) -> ParleyResult<bool> {
        let dir = self.session_dir(id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Deleted session {}", id);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ParleyError::io_at(
                format!("Failed to delete session directory: {}", e),
                &dir,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::{Message, Usage};
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_session_is_fresh_and_not_written() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let state = store.load("new-one").await.unwrap();
        assert_eq!(state.id(), "new-one");
        assert!(state.history.is_empty());
        assert!(!store.exists("new-one").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let mut state = SessionState::new("s1");
        state.add_message(Message::user("q"));
        state.add_message(Message::assistant("a"));
        state.header.record_turn(&Usage::new(7, 3));
        let before = state.header.updated_at;

        store.store(&mut state).await.unwrap();
        assert!(state.header.updated_at >= before);

        let loaded = store.load("s1").await.unwrap();
        assert_eq!(loaded, state);
        assert!(dir.path().join("s1").join("header.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_is_fatal() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let mut state = SessionState::new("s1");
        store.store(&mut state).await.unwrap();

        std::fs::write(store.state_path("s1").unwrap(), "{trunc").unwrap();
        assert!(store.load("s1").await.is_err());
    }

    #[tokio::test]
    async fn test_list_sorts_newest_first_and_skips_bad_headers() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        for (id, day) in [("old", 1), ("newest", 3), ("middle", 2)] {
            let mut state = SessionState::new(id);
            state.header.created_at = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
            store.store(&mut state).await.unwrap();
        }
        std::fs::create_dir_all(dir.path().join("broken")).unwrap();
        std::fs::write(dir.path().join("broken").join("header.json"), "not json").unwrap();
        std::fs::write(dir.path().join("stray-file"), "x").unwrap();

        let ids: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.session_id)
            .collect();
        assert_eq!(ids, vec!["newest", "middle", "old"]);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("absent"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let mut state = SessionState::new("gone");
        store.store(&mut state).await.unwrap();

        assert!(store.delete("gone").await.unwrap());
        assert!(!store.delete("gone").await.unwrap());
        assert!(!store.exists("gone").await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exists_reports_unreadable_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, "x").unwrap();
        let store = SessionStore::new(&root);

        let err = store.exists("s1").await.unwrap_err();
        assert!(matches!(err, ParleyError::Io { .. }), "{:?}", err);
    }

    #[test]
    fn test_rejects_escaping_ids() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(validate_session_id(bad).is_err(), "{:?}", bad);
        }
        assert!(validate_session_id("my chat.v2").is_ok());
    }
}
