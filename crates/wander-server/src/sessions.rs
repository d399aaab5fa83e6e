//! In-memory per-session suggestion state.
//!
//! Each session sits behind its own async mutex so concurrent requests for one
//! session apply their navigator transitions one at a time, while different
//! sessions never contend. Idle sessions are pruned whenever a session is
//! stored.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use wander_suggest::SuggestionSession;

pub type SharedSession = Arc<Mutex<SuggestionSession>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Stores `session` under `id`, replacing any previous session there.
    pub async fn insert(&self, id: &str, session: SuggestionSession) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned idle sessions");
        }
        entries.insert(
            id.to_string(),
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_seen: now,
            },
        );
    }

    /// Returns the live session for `id` and marks it as seen. Expired
    /// sessions are dropped and reported as missing.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(id)?;
        if now.duration_since(entry.last_seen) >= self.ttl {
            entries.remove(id);
            return None;
        }
        entry.last_seen = now;
        Some(Arc::clone(&entry.session))
    }

    pub async fn active_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}
