//! In-Memory Session Store Adapter
//!
//! Keeps every session in a process-local map. The map lock is only held to
//! find or insert a session's mutex; all work on a session happens under that
//! session's own mutex.
//!
//! With an idle TTL configured, sessions untouched for longer than the TTL are
//! dropped by [`InMemorySessionStore::evict_idle`], which a background sweep
//! calls periodically. A session in use by a turn is never evicted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::dialogue::{Session, DEFAULT_MAX_HISTORY};
use crate::domain::foundation::SessionId;
use crate::ports::{SessionGuard, SessionMutator, SessionStore, SessionStoreError};

#[derive(Debug, Clone)]
struct SessionSlot {
    session: Arc<Mutex<Session>>,
    /// Milliseconds since the store's epoch at the last access.
    last_used: Arc<AtomicU64>,
}

/// In-memory storage for dialogue sessions
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionSlot>>>,
    max_history: usize,
    idle_ttl: Option<Duration>,
    epoch: Instant,
}

impl InMemorySessionStore {
    /// Create a store whose sessions keep `max_history` turns
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_history,
            idle_ttl: None,
            epoch: Instant::now(),
        }
    }

    /// Evict sessions that have been idle for longer than `ttl`
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    /// Clear all sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Drops every session idle for longer than the TTL and returns how many
    /// were removed. Does nothing without a TTL.
    ///
    /// A slot referenced outside the map belongs to a caller that is inside,
    /// or waiting for, the session's exclusive section; such slots are kept.
    pub async fn evict_idle(&self) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let now = self.now_ms();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| {
            let idle_ms = now.saturating_sub(slot.last_used.load(Ordering::Acquire));
            idle_ms <= ttl_ms || Arc::strong_count(&slot.session) > 1
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Runs [`evict_idle`](Self::evict_idle) every `every` until the handle is
    /// aborted or the runtime shuts down.
    pub fn spawn_idle_sweep(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                store.evict_idle().await;
            }
        })
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn touch(&self, slot: &SessionSlot) {
        slot.last_used.store(self.now_ms(), Ordering::Release);
    }

    async fn slot(&self, id: &SessionId) -> Option<SessionSlot> {
        let slot = self.sessions.read().await.get(id).cloned()?;
        self.touch(&slot);
        Some(slot)
    }

    async fn slot_or_create(&self, id: &SessionId) -> SessionSlot {
        if let Some(slot) = self.slot(id).await {
            return slot;
        }

        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "creating session");
                SessionSlot {
                    session: Arc::new(Mutex::new(Session::new(id.clone(), self.max_history))),
                    last_used: Arc::new(AtomicU64::new(0)),
                }
            })
            .clone();
        self.touch(&slot);
        slot
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &SessionId) -> Session {
        let slot = self.slot_or_create(id).await;
        let session = slot.session.lock().await;
        session.clone()
    }

    async fn lock(&self, id: &SessionId) -> SessionGuard {
        self.slot_or_create(id).await.session.lock_owned().await
    }

    async fn update(
        &self,
        id: &SessionId,
        mutator: SessionMutator,
    ) -> Result<Session, SessionStoreError> {
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| SessionStoreError::NotFound(id.clone()))?;
        let mut session = slot.session.lock().await;
        mutator(&mut *session);
        Ok(session.clone())
    }

    async fn reset(&self, id: &SessionId) -> Result<Session, SessionStoreError> {
        self.update(id, Box::new(|session| session.reset())).await
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
