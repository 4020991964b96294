use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::AppError;
use crate::wizard::machine::Wizard;

/// Idle time after which a session is dropped, unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// One teacher's wizard. Lives only in process memory.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub wizard: Wizard,
}

pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// In-memory session registry shared by all handlers.
///
/// The map lock is held only to look up or insert a handle; each session has
/// its own mutex so a slow model call in one session never blocks another.
/// Sessions not looked up for `ttl` are evicted by `evict_idle`.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self) -> SessionHandle {
        let session = Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            wizard: Wizard::new(),
        };
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::info!(session = %id, "Session created");
        handle
    }

    /// Looks up a session and marks it as active.
    pub async fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        entry.last_seen = Instant::now();
        Ok(entry.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session = %id, "Session discarded");
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Session {id} not found"))),
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for longer than the TTL. Returns how many
    /// were dropped. A request still holding a handle finishes normally.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Runs `evict_idle` every `period` until the runtime shuts down.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.evict_idle().await;
            }
        })
    }
}
