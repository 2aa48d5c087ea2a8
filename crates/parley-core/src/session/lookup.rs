//! Terminal → session pointer files
//!
//! The mapping for a terminal lives at
//! `<root>/<boot_id>/<terminal_id>.<boot_id>` and contains the raw session id.
//! Mappings of previous boots are orphaned, never cleaned up.

use super::identity::TerminalIdentity;
use crate::error::{ParleyError, ParleyResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SessionLookup {
    root: PathBuf,
    identity: TerminalIdentity,
}

impl SessionLookup {
    pub fn new(root: impl Into<PathBuf>, identity: TerminalIdentity) -> Self {
        Self {
            root: root.into(),
            identity,
        }
    }

    /// `<tmp>/parley/session-lookup`
    pub fn default_root() -> PathBuf {
        std::env::temp_dir().join("parley").join("session-lookup")
    }

    /// Lookup for the current terminal under the default root
    pub fn detect() -> ParleyResult<Self> {
        Ok(Self::new(Self::default_root(), TerminalIdentity::detect()?))
    }

    pub fn identity(&self) -> &TerminalIdentity {
        &self.identity
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.root
            .join(&self.identity.boot_id)
            .join(self.identity.combined())
    }

    /// Session id mapped to this terminal, if any. An empty file counts as absent.
    pub async fn current(&self) -> ParleyResult<Option<String>> {
        let path = self.mapping_path();
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ParleyError::io_at(
                format!("Failed to read session mapping file: {}", e),
                &path,
            )),
        }
    }

    /// Session id to use: the override if given, else this terminal's mapping,
    /// else a new UUID that is recorded as the mapping.
    pub async fn resolve(&self, override_id: Option<&str>) -> ParleyResult<String> {
        if let Some(id) = override_id.filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        if let Some(id) = self.current().await? {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.write_atomic(&id).await?;
        info!("Started session {} for terminal {}", id, self.identity.terminal_id);
        Ok(id)
    }

    /// Point this terminal at `session_id`
    pub async fn set(&self, session_id: &str) -> ParleyResult<()> {
        self.clear().await?;
        self.write_atomic(session_id).await?;
        debug!("Terminal {} now uses session {}", self.identity.terminal_id, session_id);
        Ok(())
    }

    /// Forget this terminal's mapping
    pub async fn clear(&self) -> ParleyResult<()> {
        let path = self.mapping_path();
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ParleyError::io_at(
                format!("Failed to remove session mapping file: {}", e),
                &path,
            )),
        }
    }

    async fn write_atomic(&self, session_id: &str) -> ParleyResult<()> {
        let path = self.mapping_path();
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to create session lookup directory: {}", e), dir)
        })?;

        let tmp = dir.join(format!(".{}.{}.tmp", self.identity.combined(), Uuid::new_v4()));
        fs::write(&tmp, session_id).await.map_err(|e| {
            ParleyError::io_at(format!("Failed to write session mapping file: {}", e), &tmp)
        })?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ParleyError::io_at(
                format!("Failed to record session mapping: {}", e),
                &path,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lookup(dir: &TempDir, terminal: &str) -> SessionLookup {
        SessionLookup::new(dir.path(), TerminalIdentity::new(terminal, "boot1"))
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let lookup = lookup(&dir, "111");

        let first = lookup.resolve(None).await.unwrap();
        let second = lookup.resolve(None).await.unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(
            lookup.mapping_path(),
            dir.path().join("boot1").join("111.boot1")
        );
    }

    #[tokio::test]
    async fn test_override_wins_and_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let lookup = lookup(&dir, "111");

        assert_eq!(lookup.resolve(Some("named")).await.unwrap(), "named");
        assert_eq!(lookup.current().await.unwrap(), None);
        // empty override behaves like none
        let id = lookup.resolve(Some("")).await.unwrap();
        assert_eq!(lookup.current().await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn test_set_and_clear() {
        let dir = TempDir::new().unwrap();
        let lookup = lookup(&dir, "111");

        lookup.set("alpha").await.unwrap();
        assert_eq!(lookup.resolve(None).await.unwrap(), "alpha");
        lookup.set("beta").await.unwrap();
        assert_eq!(lookup.current().await.unwrap(), Some("beta".to_string()));

        lookup.clear().await.unwrap();
        lookup.clear().await.unwrap();
        assert_eq!(lookup.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_terminals_are_independent() {
        let dir = TempDir::new().unwrap();
        lookup(&dir, "111").set("one").await.unwrap();
        lookup(&dir, "222").set("two").await.unwrap();

        assert_eq!(lookup(&dir, "111").current().await.unwrap().as_deref(), Some("one"));
        assert_eq!(lookup(&dir, "222").current().await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_empty_mapping_file_counts_as_absent() {
        let dir = TempDir::new().unwrap();
        let lookup = lookup(&dir, "111");
        std::fs::create_dir_all(lookup.mapping_path().parent().unwrap()).unwrap();
        std::fs::write(lookup.mapping_path(), "").unwrap();

        assert_eq!(lookup.current().await.unwrap(), None);
        let id = lookup.resolve(None).await.unwrap();
        assert!(!id.is_empty());
    }
}
