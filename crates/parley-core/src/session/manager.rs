//! Session lifecycle operations spanning the store and the terminal lookup

use super::lookup::SessionLookup;
use super::store::{SessionStore, validate_session_id};
use super::types::SessionState;
use crate::error::{ParleyError, ParleyResult};
use tracing::info;
use uuid::Uuid;

/// Characters allowed in user-chosen session names
pub fn is_allowed_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ' ' | '.')
}

pub fn is_valid_session_name(name: &str) -> bool {
    name.chars().all(is_allowed_name_char)
}

/// True when `id` is a generated (UUID) session id rather than a chosen name
pub fn is_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

fn check_name(name: &str) -> ParleyResult<()> {
    if !is_valid_session_name(name) {
        return Err(ParleyError::invalid_input_field(
            format!("Invalid session name: {}", name),
            "session",
        ));
    }
    validate_session_id(name)
}

pub struct SessionManager {
    store: SessionStore,
    lookup: SessionLookup,
    override_id: Option<String>,
}

impl SessionManager {
    pub fn new(store: SessionStore, lookup: SessionLookup) -> Self {
        Self {
            store,
            lookup,
            override_id: None,
        }
    }

    /// Use `session` instead of the terminal's mapping (e.g. `--session`)
    pub fn with_override(mut self, session: Option<String>) -> Self {
        self.override_id = session.filter(|s| !s.is_empty());
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn lookup(&self) -> &SessionLookup {
        &self.lookup
    }

    pub fn override_id(&self) -> Option<&str> {
        self.override_id.as_deref()
    }

    /// Session id for this terminal, creating a mapping on first use
    pub async fn current_id(&self) -> ParleyResult<String> {
        self.lookup.resolve(self.override_id.as_deref()).await
    }

    pub async fn load_current(&self) -> ParleyResult<SessionState> {
        let id = self.current_id().await?;
        self.store.load(&id).await
    }

    /// Start a new session and make it current. An empty name yields a UUID.
    /// The returned state is not stored yet.
    pub async fn new_session(&self, name: &str) -> ParleyResult<SessionState> {
        let id = if name.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            check_name(name)?;
            name.to_string()
        };

        if self.store.exists(&id).await? {
            return Err(ParleyError::session(format!("Session already exists: {}", id), id));
        }

        self.lookup.clear().await?;
        self.lookup.set(&id).await?;
        info!("Created session {}", id);
        Ok(SessionState::new(id))
    }

    /// Make `id` this terminal's current session
    pub async fn set_current(&self, id: &str) -> ParleyResult<()> {
        validate_session_id(id)?;
        self.lookup.set(id).await
    }

    /// Detach this terminal from its session
    pub async fn quit(&self) -> ParleyResult<()> {
        if let Some(id) = &self.override_id {
            return Err(ParleyError::session(
                "Cannot quit session with external session override",
                id.clone(),
            ));
        }
        self.lookup.clear().await
    }

    /// Copy `from` (default: current session) to `to`; the terminal follows
    /// the copy when `from` was current. Returns `(from, to)`.
    pub async fn copy(&self, from: Option<&str>, to: &str) -> ParleyResult<(String, String)> {
        if to.is_empty() {
            return Err(ParleyError::invalid_input_field("No new session id provided", "session"));
        }
        check_name(to)?;

        let current = self.current_id().await?;
        let from = from.filter(|f| !f.is_empty()).unwrap_or(current.as_str()).to_string();
        validate_session_id(&from)?;

        if self.store.exists(to).await? {
            return Err(ParleyError::session(format!("Session already exists: {}", to), to));
        }

        if !self.store.exists(&from).await? {
            if from == current {
                // nothing stored yet, only the pointer moves
                self.lookup.set(to).await?;
                return Ok((from, to.to_string()));
            }
            return Err(ParleyError::not_found_resource(
                format!("Session not found: {}", from),
                "session",
            ));
        }

        let mut state = self.store.load(&from).await?;
        state.header.session_id = to.to_string();
        self.store.store(&mut state).await?;
        if from == current {
            self.lookup.set(to).await?;
        }

        info!("Copied session {} to {}", from, to);
        Ok((from, to.to_string()))
    }

    /// Copy, then delete the source if it was stored
    pub async fn rename(&self, from: Option<&str>, to: &str) -> ParleyResult<(String, String)> {
        let (from, to) = self.copy(from, to).await?;
        if self.store.exists(&from).await? {
            self.store.delete(&from).await?;
        }
        info!("Renamed session {} to {}", from, to);
        Ok((from, to))
    }

    /// Delete a stored session; the terminal mapping is cleared if it pointed
    /// at it. Returns whether anything was deleted.
    pub async fn delete(&self, id: &str) -> ParleyResult<bool> {
        let deleted = self.store.delete(id).await?;
        if self.lookup.current().await?.as_deref() == Some(id) {
            self.lookup.clear().await?;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::Message;
    use crate::session::identity::TerminalIdentity;
    use tempfile::TempDir;

    fn test_manager(dir: &TempDir) -> SessionManager {
        SessionManager::new(
            SessionStore::new(dir.path().join("sessions")),
            SessionLookup::new(dir.path().join("lookup"), TerminalIdentity::new("77", "boot")),
        )
    }

    async fn stored(manager: &SessionManager, id: &str) {
        let mut state = SessionState::new(id);
        state.add_message(Message::user(format!("hello from {}", id)));
        manager.store().store(&mut state).await.unwrap();
    }

    #[test]
    fn test_name_rules() {
        assert!(is_valid_session_name("My chat_2-b.v1"));
        assert!(is_valid_session_name("påsk"));
        assert!(!is_valid_session_name("a/b"));
        assert!(!is_valid_session_name("semi;colon"));
        assert!(is_uuid("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(!is_uuid("my_session"));
    }

    #[tokio::test]
    async fn test_new_session_becomes_current() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);

        let state = manager.new_session("work").await.unwrap();
        assert_eq!(state.id(), "work");
        assert_eq!(manager.current_id().await.unwrap(), "work");

        let generated = manager.new_session("").await.unwrap();
        assert!(is_uuid(generated.id()));

        stored(&manager, "taken").await;
        assert!(manager.new_session("taken").await.is_err());
        assert!(manager.new_session("bad/name").await.is_err());
    }

    #[tokio::test]
    async fn test_copy_stored_current_session() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);
        manager.set_current("src").await.unwrap();
        stored(&manager, "src").await;

        let (from, to) = manager.copy(None, "dst").await.unwrap();
        assert_eq!((from.as_str(), to.as_str()), ("src", "dst"));
        assert!(manager.store().exists("src").await.unwrap());
        assert_eq!(manager.current_id().await.unwrap(), "dst");

        let copied = manager.store().load("dst").await.unwrap();
        assert_eq!(copied.id(), "dst");
        assert_eq!(copied.message_history(), vec![Message::user("hello from src")]);

        assert!(manager.copy(Some("src"), "dst").await.is_err());
    }

    #[tokio::test]
    async fn test_copy_unstored_current_only_moves_pointer() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);
        manager.set_current("draft").await.unwrap();

        manager.copy(None, "named").await.unwrap();
        assert_eq!(manager.current_id().await.unwrap(), "named");
        assert!(!manager.store().exists("named").await.unwrap());

        assert!(manager.copy(Some("ghost"), "other").await.is_err());
    }

    #[tokio::test]
    async fn test_rename_removes_source() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);
        stored(&manager, "a").await;
        manager.set_current("elsewhere").await.unwrap();

        manager.rename(Some("a"), "b").await.unwrap();
        assert!(!manager.store().exists("a").await.unwrap());
        assert!(manager.store().exists("b").await.unwrap());
        assert_eq!(manager.current_id().await.unwrap(), "elsewhere");
    }

    #[tokio::test]
    async fn test_delete_clears_mapping_of_current_session() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir);
        stored(&manager, "cur").await;
        stored(&manager, "other").await;
        manager.set_current("cur").await.unwrap();

        assert!(manager.delete("other").await.unwrap());
        assert_eq!(manager.lookup().current().await.unwrap().as_deref(), Some("cur"));

        assert!(manager.delete("cur").await.unwrap());
        assert_eq!(manager.lookup().current().await.unwrap(), None);
        assert!(!manager.delete("cur").await.unwrap());
    }

    #[tokio::test]
    async fn test_quit_refused_with_override() {
        let dir = TempDir::new().unwrap();
        let manager = test_manager(&dir).with_override(Some("pinned".to_string()));

        assert_eq!(manager.current_id().await.unwrap(), "pinned");
        assert!(manager.quit().await.is_err());

        let manager = test_manager(&dir);
        manager.set_current("x").await.unwrap();
        manager.quit().await.unwrap();
        assert_eq!(manager.lookup().current().await.unwrap(), None);
    }
}
