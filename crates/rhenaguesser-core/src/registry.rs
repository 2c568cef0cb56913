//! In-memory store of live sessions.
//!
//! The map itself sits behind a [`RwLock`] that is only held long enough
//! to look up or insert a handle. Every session has its own [`Mutex`];
//! the coordinator holds it for the whole read-validate-mutate-emit
//! sequence of one message, which serializes all work on that session
//! while different sessions proceed in parallel.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use rhenaguesser_types::SessionId;
use tokio::sync::{Mutex, RwLock};

use crate::session::Session;
use crate::topic::Topic;

/// A session together with its subscribers.
#[derive(Debug)]
pub struct SessionEntry {
    /// Game state.
    pub session: Session,
    /// Connections receiving this session's broadcasts.
    pub topic: Topic,
}

impl SessionEntry {
    /// Wrap a session with an empty topic.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            topic: Topic::default(),
        }
    }
}

/// Shared, lockable handle to one session.
pub type SessionHandle = Arc<Mutex<SessionEntry>>;

/// All live sessions keyed by code.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session.
    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Insert or replace a session under its own id.
    pub async fn set(&self, entry: SessionEntry) -> SessionHandle {
        let id = entry.session.id().clone();
        let handle = Arc::new(Mutex::new(entry));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    /// Insert a session only if its id is free.
    ///
    /// # Errors
    ///
    /// Gives the entry back when the id is already taken.
    pub async fn insert_new(&self, entry: SessionEntry) -> Result<SessionHandle, SessionEntry> {
        let mut sessions = self.sessions.write().await;
        match sessions.entry(entry.session.id().clone()) {
            Entry::Occupied(_) => Err(entry),
            Entry::Vacant(slot) => {
                let handle = Arc::new(Mutex::new(entry));
                slot.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Remove a session, returning whether it existed.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Snapshot of every session handle, sorted by id.
    pub async fn list_all(&self) -> Vec<(SessionId, SessionHandle)> {
        let mut all: Vec<(SessionId, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rhenaguesser_types::{Coordinate, Picture, PictureId, Player, PlayerId};

    use super::*;

    fn entry(code: &str) -> SessionEntry {
        let creator = Player {
            id: PlayerId::from("p1"),
            username: "Ada".to_owned(),
        };
        let pictures = vec![Picture {
            id: PictureId::from("pic"),
            position: Coordinate::new(0.0, 0.0),
        }];
        SessionEntry::new(Session::new(SessionId::from(code), creator, pictures).unwrap())
    }

    #[tokio::test]
    async fn insert_new_refuses_taken_ids() {
        let registry = SessionRegistry::new();
        assert!(registry.insert_new(entry("AAAA")).await.is_ok());

        let taken = registry.insert_new(entry("AAAA")).await;
        assert!(taken.is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let registry = SessionRegistry::new();
        registry.set(entry("BBBB")).await;
        registry.set(entry("AAAA")).await;

        let handle = registry.get(&SessionId::from("BBBB")).await;
        assert!(handle.is_some());

        let ids: Vec<String> = registry
            .list_all()
            .await
            .into_iter()
            .map(|(id, _)| id.into_inner())
            .collect();
        assert_eq!(ids, ["AAAA", "BBBB"]);

        assert!(registry.remove(&SessionId::from("AAAA")).await);
        assert!(!registry.remove(&SessionId::from("AAAA")).await);
        assert!(registry.get(&SessionId::from("AAAA")).await.is_none());
    }

    #[tokio::test]
    async fn set_replaces_existing_entry() {
        let registry = SessionRegistry::new();
        let first = registry.set(entry("CCCC")).await;
        let second = registry.set(entry("CCCC")).await;
        assert!(!Arc::ptr_eq(&first, &second));
        let current = registry.get(&SessionId::from("CCCC")).await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert_eq!(registry.len().await, 1);
    }
}
