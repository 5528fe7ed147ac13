//! In-memory registry of active review sessions
//!
//! Each session sits behind its own mutex, so submissions to one session are
//! serialized while different sessions proceed independently. Sessions left
//! untouched for longer than the registry's time-to-live are evicted the next
//! time a session is registered.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use vocab_srs_core::Session;

/// A session and the user it belongs to
#[derive(Debug)]
pub struct SessionEntry {
    pub user_id: String,
    pub session: Session,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Mark the session as used at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_active_at > ttl
    }
}

pub type SharedSession = Arc<Mutex<SessionEntry>>;

/// Default time-to-live for idle sessions
pub const DEFAULT_SESSION_TTL_MINUTES: u32 = 60;

#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(i64::from(DEFAULT_SESSION_TTL_MINUTES)))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Register a session and return its id
    pub async fn insert(&self, user_id: &str, session: Session) -> Uuid {
        let now = Utc::now();
        let evicted = self.evict_expired(now).await;
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted idle review sessions");
        }

        let id = Uuid::new_v4();
        let entry = SessionEntry {
            user_id: user_id.to_string(),
            session,
            started_at: now,
            last_active_at: now,
        };
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(entry)));
        id
    }

    /// Drop every session idle for longer than the time-to-live at `now`.
    ///
    /// Sessions locked by an in-flight request are in use and kept.
    /// Returns the number of sessions removed.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, shared| match shared.try_lock() {
            Ok(entry) => !entry.is_expired(now, self.ttl),
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Drop a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocab_srs_core::ReviewRecord;

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::new();
        let session = Session::start(vec![ReviewRecord::new("hola")]);
        let id = registry.insert("user_1", session).await;

        let entry = registry.get(id).await.unwrap();
        let entry = entry.lock().await;
        assert_eq!(entry.user_id, "user_1");
        assert_eq!(entry.session.current().unwrap().word_id, "hola");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SessionRegistry::new();
        let id = registry.insert("user_1", Session::start(Vec::new())).await;

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_evicts_idle_sessions() {
        let registry = SessionRegistry::with_ttl(Duration::minutes(30));
        let stale = registry.insert("user_1", Session::start(Vec::new())).await;
        let fresh = registry
            .insert("user_1", Session::start(vec![ReviewRecord::new("hola")]))
            .await;

        let now = Utc::now();
        {
            let entry = registry.get(stale).await.unwrap();
            entry.lock().await.touch(now - Duration::hours(2));
        }

        assert_eq!(registry.evict_expired(now).await, 1);
        assert!(registry.get(stale).await.is_none());
        assert!(registry.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_insert_sweeps_expired_sessions() {
        let registry = SessionRegistry::with_ttl(Duration::minutes(30));
        let stale = registry.insert("user_1", Session::start(Vec::new())).await;
        {
            let entry = registry.get(stale).await.unwrap();
            entry.lock().await.touch(Utc::now() - Duration::hours(1));
        }

        registry.insert("user_2", Session::start(Vec::new())).await;

        assert!(registry.get(stale).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_locked_session_is_not_evicted() {
        let registry = SessionRegistry::with_ttl(Duration::minutes(30));
        let id = registry.insert("user_1", Session::start(Vec::new())).await;
        let shared = registry.get(id).await.unwrap();
        let mut entry = shared.lock().await;
        entry.touch(Utc::now() - Duration::hours(3));

        assert_eq!(registry.evict_expired(Utc::now()).await, 0);
        drop(entry);
        assert_eq!(registry.evict_expired(Utc::now()).await, 1);
    }

    #[test]
    fn test_unknown_session() {
        let registry = SessionRegistry::new();
        let found = tokio_test::block_on(registry.get(Uuid::new_v4()));
        assert!(found.is_none());
    }
}
