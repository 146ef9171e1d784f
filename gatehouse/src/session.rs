//! Session storage abstraction.
//!
//! A [`SessionStore`] is a key-value view of *one client's* session data,
//! shared by every scope through scope-prefixed keys. It is pure storage:
//! no policy, no retries, failures passed through unmodified. Operations are
//! synchronous - the core treats session access as local-store bound and adds
//! no locking of its own. Concurrent requests for the same client session are
//! an accepted external-store concern (last write wins or stronger, per the
//! backing store).
//!
//! [`MemorySessions`] provides the in-process implementation used by the demo
//! server and the test suite, keyed by an opaque session id carried in a
//! cookie by the API layer.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::Result;

/// Key-value view of a single client's session.
pub trait SessionStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any existing entry.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove the entry under `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory session for a single client.
#[derive(Debug, Default)]
pub struct MemorySession {
    entries: DashMap<String, Value>,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Registry of in-memory sessions, keyed by opaque session id.
///
/// One entry per client; entries live for the life of the process. Cookie
/// handling (issuing and reading the session id) belongs to the API layer.
#[derive(Debug, Default)]
pub struct MemorySessions {
    sessions: DashMap<Uuid, Arc<MemorySession>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its id.
    pub fn create(&self) -> (Uuid, Arc<MemorySession>) {
        let id = Uuid::new_v4();
        let session = Arc::new(MemorySession::default());
        self.sessions.insert(id, session.clone());
        (id, session)
    }

    /// Look up an existing session by id.
    pub fn find(&self, id: Uuid) -> Option<Arc<MemorySession>> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop a session, signing the client out of every scope at once.
    pub fn remove(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
