//! Session persistence seam.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::session::{Session, SessionCode};
use super::types::GameError;

/// Durable mapping from session code to session record.
///
/// `insert` must be atomic insert-if-absent: it is what keeps two sessions
/// from ever sharing a code.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session. Returns `false` without writing when the code
    /// is already taken.
    async fn insert(&self, session: Session) -> Result<bool, GameError>;

    async fn find(&self, code: SessionCode) -> Result<Option<Session>, GameError>;

    /// Overwrite an existing record.
    async fn update(&self, session: Session) -> Result<(), GameError>;

    /// Number of stored sessions.
    async fn count(&self) -> Result<usize, GameError>;
}

/// Process-local store. Records live as long as the process.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionCode, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> Result<bool, GameError> {
        let mut sessions = self.sessions.write().await;
        let code = session.code();
        if sessions.contains_key(&code) {
            debug!(code, "session code already taken");
            return Ok(false);
        }
        sessions.insert(code, session);
        Ok(true)
    }

    async fn find(&self, code: SessionCode) -> Result<Option<Session>, GameError> {
        Ok(self.sessions.read().await.get(&code).cloned())
    }

    async fn update(&self, session: Session) -> Result<(), GameError> {
        let mut sessions = self.sessions.write().await;
        let code = session.code();
        match sessions.get_mut(&code) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(GameError::NotFound(code)),
        }
    }

    async fn count(&self) -> Result<usize, GameError> {
        Ok(self.sessions.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lobby(code: SessionCode, creator: &str) -> Session {
        Session::new_online(code, "Food".into(), "Pizza".into(), 1, creator, None).unwrap()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemorySessionStore::new();
        assert!(store.insert(lobby(100_001, "Ana")).await.unwrap());
        let found = store.find(100_001).await.unwrap().unwrap();
        assert_eq!(found.players()[0], "Ana");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_refuses_taken_code() {
        let store = InMemorySessionStore::new();
        assert!(store.insert(lobby(100_001, "Ana")).await.unwrap());
        assert!(!store.insert(lobby(100_001, "Ben")).await.unwrap());
        let found = store.find(100_001).await.unwrap().unwrap();
        assert_eq!(found.players()[0], "Ana");
    }

    #[tokio::test]
    async fn find_missing_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.find(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_overwrites() {
        let store = InMemorySessionStore::new();
        let mut s = lobby(100_002, "Ana");
        store.insert(s.clone()).await.unwrap();
        s.join("Ben", 20).unwrap();
        store.update(s).await.unwrap();
        let found = store.find(100_002).await.unwrap().unwrap();
        assert_eq!(found.players().len(), 2);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.update(lobby(7, "Ana")).await.unwrap_err();
        assert!(matches!(err, GameError::NotFound(7)));
    }
}
