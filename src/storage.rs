//! Client-local persistence for the session token and user snapshot.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionStore` writes here after every successful sign-in and reads it
//! once on start. Both backends hold exactly one record; there is no history.
//!
//! TRADE-OFFS
//! ==========
//! `FileStorage` writes to a sibling temp file and renames over the target so
//! a crash mid-write never leaves a half-written token behind.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::net::types::User;

/// The persisted token + user snapshot pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub user: User,
}

/// Where a session survives between application runs.
#[async_trait::async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the persisted record, if any.
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError>;

    /// Replace the persisted record.
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;

    /// Remove the persisted record. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local storage, used by tests and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<PersistedSession>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with `session`, as if a previous run had saved it.
    #[must_use]
    pub fn with_session(session: PersistedSession) -> Self {
        Self { slot: Mutex::new(Some(session)) }
    }

    /// Current record without going through the async trait.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.slot.lock().map(|slot| slot.clone()).unwrap_or_default()
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Option<PersistedSession>) -> R) -> Result<R, SessionError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| SessionError::Storage("memory storage lock poisoned".to_owned()))?;
        Ok(f(&mut *slot))
    }
}

#[async_trait::async_trait]
impl SessionStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        self.with_slot(|slot| slot.clone())
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        self.with_slot(|slot| *slot = Some(session.clone()))
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.with_slot(|slot| *slot = None)
    }
}

// =============================================================================
// FILE
// =============================================================================

/// A single JSON file on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, SessionError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionError::Storage(format!("corrupt session file {}: {e}", self.path.display())))
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(session)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
