use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{session_key, Session, SessionSummary, SESSION_KEY_PREFIX};
use crate::storage::KeyValueStore;
use crate::types::Message;
use crate::Result;

/// Append-only conversation store with write-through persistence.
///
/// The current session lives behind an async mutex that is held across the
/// store write, so interleaved appends are applied one at a time and none is
/// lost. The in-memory record is only updated after the write succeeded.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    current: Mutex<Option<Session>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: Mutex::new(None),
        }
    }

    /// Begin a fresh session and make it current.
    ///
    /// The previous session's persisted record is left untouched.
    pub async fn start_session(&self) -> Session {
        let session = Session::new();
        debug!(session_id = %session.id, "session started");
        *self.current.lock().await = Some(session.clone());
        session
    }

    /// Make a persisted session current again so later appends extend it.
    /// Returns `None`, leaving the current session as it was, when no such
    /// session is stored.
    pub async fn resume_session(&self, id: &str) -> Result<Option<Session>> {
        let mut current = self.current.lock().await;
        let Some(session) = self.load_session(id).await? else {
            return Ok(None);
        };
        debug!(session_id = %session.id, messages = session.messages.len(), "session resumed");
        *current = Some(session.clone());
        Ok(Some(session))
    }

    /// Append `message` to the current session (starting one if needed) and
    /// persist the whole record. Returns the updated session.
    pub async fn append_message(&self, message: Message) -> Result<Session> {
        let mut current = self.current.lock().await;
        let mut updated = match current.as_ref() {
            Some(s) => s.clone(),
            None => {
                let s = Session::new();
                debug!(session_id = %s.id, "session started on first message");
                s
            }
        };
        updated.messages.push(message);
        self.persist(&updated).await?;
        *current = Some(updated.clone());
        Ok(updated)
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.current.lock().await.clone()
    }

    pub async fn load_session(&self, id: &str) -> Result<Option<Session>> {
        let key = session_key(id);
        let mut found = self.store.get(&[key.as_str()]).await?;
        match found.remove(&key) {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// Every persisted session, newest first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let all = self.store.get_all().await?;
        let mut sessions: Vec<Session> = all
            .into_iter()
            .filter(|(k, _)| k.starts_with(SESSION_KEY_PREFIX))
            .filter_map(|(k, v)| match serde_json::from_value::<Session>(v) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!(key = %k, error = %e, "skipping unreadable session record");
                    None
                }
            })
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    pub async fn list_summaries(&self) -> Result<Vec<SessionSummary>> {
        Ok(self
            .list_sessions()
            .await?
            .iter()
            .map(Session::summary)
            .collect())
    }

    /// Delete every persisted session and forget the current one.
    pub async fn clear_all(&self) -> Result<usize> {
        let mut current = self.current.lock().await;
        let keys: Vec<String> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(|(k, _)| k)
            .filter(|k| k.starts_with(SESSION_KEY_PREFIX))
            .collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.store.remove(&refs).await?;
        *current = None;
        info!(removed = keys.len(), "chat history cleared");
        Ok(keys.len())
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        let mut items = Map::new();
        items.insert(session.storage_key(), serde_json::to_value(session)?);
        self.store.set(items).await?;
        debug!(
            session_id = %session.id,
            messages = session.messages.len(),
            "session persisted"
        );
        Ok(())
    }
}
