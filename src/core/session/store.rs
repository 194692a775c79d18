//! In-memory session store.
//!
//! Maps session id to session state for the lifetime of a connection. The
//! store is an owned object on `AppState`, passed explicitly to whatever
//! needs it; multiple independent stores can coexist (tests rely on this).

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use super::{Session, SessionError};

/// Shared handle to one session. The inner mutex serializes mutation; one
/// connection's dispatch is sequential anyway, so contention only occurs
/// with observers like the status endpoint.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Registry of live sessions, keyed by session id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a default-configured session under `id`.
    pub fn create(&self, id: &str) -> Result<SessionHandle, SessionError> {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(_) => Err(SessionError::DuplicateSession(id.to_string())),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(Session::new(id)));
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<SessionHandle, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))
    }

    /// Remove a session. Idempotent: removing an absent id is a no-op.
    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of all live sessions (status endpoint).
    pub fn ids(&self) -> Vec<String> {
        self.sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_get_remove_lifecycle() {
        let store = SessionStore::new();
        assert!(store.is_empty());

        let handle = store.create("s1").unwrap();
        assert_eq!(handle.lock().await.id, "s1");
        assert_eq!(store.len(), 1);

        let same = store.get("s1").unwrap();
        assert!(Arc::ptr_eq(&handle, &same));

        store.remove("s1");
        assert!(matches!(
            store.get("s1"),
            Err(SessionError::UnknownSession(_))
        ));
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let store = SessionStore::new();
        store.create("s1").unwrap();
        assert!(matches!(
            store.create("s1"),
            Err(SessionError::DuplicateSession(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = SessionStore::new();
        store.create("s1").unwrap();
        store.remove("s1");
        store.remove("s1");
        assert!(store.is_empty());
    }

    #[test]
    fn stores_are_independent() {
        let a = SessionStore::new();
        let b = SessionStore::new();
        a.create("s1").unwrap();
        assert!(b.get("s1").is_err());
    }
}
