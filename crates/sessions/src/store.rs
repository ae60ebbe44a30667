//! In-memory session store.
//!
//! The map from session id to history is guarded by one `RwLock` that is
//! held only to look up or insert a handle. Each history has its own
//! `Mutex`, so appends to different sessions never contend.
//! Neither lock is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use teammate_core::error::ProtocolError;
use teammate_core::message::{Message, SessionId};
use tracing::debug;

/// Shared handle to one session's history.
///
/// Clones point at the same history; [`Session::same_as`] tells whether two
/// handles do.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    history: Arc<Mutex<Vec<Message>>>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Copy of the history in chat order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append one message. Returns the new history length.
    pub fn append(&self, message: Message) -> usize {
        let mut history = self.lock();
        history.push(message);
        history.len()
    }

    pub fn same_as(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.history, &other.history)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        // A panic while holding the lock cannot leave a Vec half-pushed.
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Process-wide mapping from session id to history.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `id`, creating an empty one on first use.
    ///
    /// The flag is `true` when this call created the session.
    pub fn get_or_create(&self, id: &SessionId) -> (Session, bool) {
        if let Some(session) = self.get(id) {
            return (session, false);
        }

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        // Another task may have inserted between the read and write locks.
        if let Some(session) = sessions.get(id) {
            return (session.clone(), false);
        }

        let session = Session::new(id.clone());
        sessions.insert(id.clone(), session.clone());
        debug!(session_id = %id, "Session created");
        (session, true)
    }

    /// Look up an existing session.
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Append to an existing session's history.
    pub fn append(&self, id: &SessionId, message: Message) -> Result<usize, ProtocolError> {
        let session = self
            .get(id)
            .ok_or_else(|| ProtocolError::SessionNotFound(id.clone()))?;
        Ok(session.append(message))
    }

    /// History of an existing session in chat order.
    pub fn history(&self, id: &SessionId) -> Result<Vec<Message>, ProtocolError> {
        self.get(id)
            .map(|s| s.snapshot())
            .ok_or_else(|| ProtocolError::SessionNotFound(id.clone()))
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str) -> Message {
        Message::user(id, format!("body of {id}"), json!(1))
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");

        let (first, created) = store.get_or_create(&id);
        assert!(created);
        let (second, created_again) = store.get_or_create(&id);
        assert!(!created_again);

        assert!(first.same_as(&second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn appends_are_visible_through_every_handle() {
        let store = SessionStore::new();
        let id = SessionId::from("s1");
        let (handle, _) = store.get_or_create(&id);

        store.append(&id, user("m1")).unwrap();
        handle.append(Message::reply("m1", "hi", json!(1)));

        let (again, _) = store.get_or_create(&id);
        let history = again.snapshot();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id(), "m1");
        assert_eq!(history[1].id(), "m1_response");
    }

    #[test]
    fn append_to_unknown_session_fails_without_side_effects() {
        let store = SessionStore::new();
        let (other, _) = store.get_or_create(&SessionId::from("other"));

        let err = store.append(&SessionId::from("ghost"), user("m1")).unwrap_err();
        assert!(matches!(err, ProtocolError::SessionNotFound(ref id) if id.as_str() == "ghost"));
        assert!(!store.contains(&SessionId::from("ghost")));
        assert!(other.is_empty());
    }

    #[test]
    fn history_of_unknown_session_fails() {
        let store = SessionStore::new();
        assert!(store.history(&SessionId::from("nope")).is_err());
    }

    #[test]
    fn sessions_are_independent() {
        let store = SessionStore::new();
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        store.get_or_create(&a);
        store.get_or_create(&b);

        store.append(&a, user("a1")).unwrap();
        store.append(&a, user("a2")).unwrap();
        store.append(&b, user("b1")).unwrap();

        assert_eq!(store.history(&a).unwrap().len(), 2);
        assert_eq!(store.history(&b).unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_per_session_order() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for s in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = SessionId::from(format!("s{s}"));
                store.get_or_create(&id);
                for m in 0..50 {
                    store.append(&id, user(&format!("{s}-{m}"))).unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.len(), 8);
        for s in 0..8 {
            let history = store.history(&SessionId::from(format!("s{s}"))).unwrap();
            assert_eq!(history.len(), 50);
            for (m, message) in history.iter().enumerate() {
                assert_eq!(message.id(), format!("{s}-{m}"));
            }
        }
    }
}
