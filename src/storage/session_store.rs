//! Session registry
//!
//! Maps session identifiers to session records and keeps a per-user index so
//! "log out everywhere else" does not scan the whole table. The in-memory
//! implementation keeps both maps behind a single lock: every mutation is
//! atomic and readers never observe a half-applied revocation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::{SharedClock, SystemClock};
use crate::constants::SESSION_ID_BYTES;
use crate::error::Result;

/// One successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate numbers for administrative views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Live sessions
    pub total: usize,
    /// Distinct users holding at least one session
    pub users: usize,
}

/// Generate a 256-bit random session identifier, hex encoded
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Session storage trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a fresh session for the user
    async fn create(&self, user_id: &str, username: &str) -> Result<Session>;

    /// Look up a session by id
    async fn get(&self, session_id: &str) -> Result<Option<Session>>;

    /// Sessions of one user, oldest first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Session>>;

    /// Every session of every user, oldest first
    async fn all(&self) -> Result<Vec<Session>>;

    /// Remove one session. Returns false when it was already absent.
    async fn revoke(&self, session_id: &str) -> Result<bool>;

    /// Remove every session of `user_id` except `keep_session_id`
    async fn revoke_all_except(&self, user_id: &str, keep_session_id: &str) -> Result<usize>;

    /// Remove every session of `user_id`
    async fn revoke_user(&self, user_id: &str) -> Result<usize>;

    async fn count(&self) -> Result<usize>;

    async fn stats(&self) -> Result<SessionStats>;
}

#[derive(Debug)]
struct StoredSession {
    // Insertion order, breaks ties between equal timestamps
    seq: u64,
    session: Session,
}

#[derive(Debug, Default)]
struct SessionTable {
    sessions: HashMap<String, StoredSession>,
    by_user: HashMap<String, Vec<String>>,
    next_seq: u64,
}

impl SessionTable {
    fn remove(&mut self, session_id: &str) -> Option<Session> {
        let stored = self.sessions.remove(session_id)?;
        let user_id = &stored.session.user_id;

        if let Some(ids) = self.by_user.get_mut(user_id) {
            ids.retain(|id| id != session_id);
            if ids.is_empty() {
                self.by_user.remove(user_id);
            }
        }

        Some(stored.session)
    }

    fn sorted(mut entries: Vec<&StoredSession>) -> Vec<Session> {
        entries.sort_by(|a, b| {
            a.session
                .created_at
                .cmp(&b.session.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        entries.into_iter().map(|s| s.session.clone()).collect()
    }
}

/// In-memory implementation of the session store
pub struct MemorySessionStore {
    table: RwLock<SessionTable>,
    clock: SharedClock,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store stamping `created_at` from the given clock
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            table: RwLock::new(SessionTable::default()),
            clock,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: &str, username: &str) -> Result<Session> {
        let mut table = self.table.write().await;

        let mut session_id = generate_session_id();
        while table.sessions.contains_key(&session_id) {
            session_id = generate_session_id();
        }

        let session = Session {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            created_at: self.clock.now(),
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.sessions.insert(
            session_id.clone(),
            StoredSession {
                seq,
                session: session.clone(),
            },
        );
        table
            .by_user
            .entry(user_id.to_string())
            .or_insert_with(Vec::new)
            .push(session_id);

        log::debug!("Session created for user {} ({} live)", user_id, table.sessions.len());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let table = self.table.read().await;
        Ok(table.sessions.get(session_id).map(|s| s.session.clone()))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let table = self.table.read().await;
        let entries: Vec<&StoredSession> = table
            .by_user
            .get(user_id)
            .map(|ids| ids.iter().filter_map(|id| table.sessions.get(id)).collect())
            .unwrap_or_default();
        Ok(SessionTable::sorted(entries))
    }

    async fn all(&self) -> Result<Vec<Session>> {
        let table = self.table.read().await;
        Ok(SessionTable::sorted(table.sessions.values().collect()))
    }

    async fn revoke(&self, session_id: &str) -> Result<bool> {
        let mut table = self.table.write().await;
        Ok(table.remove(session_id).is_some())
    }

    async fn revoke_all_except(&self, user_id: &str, keep_session_id: &str) -> Result<usize> {
        let mut table = self.table.write().await;

        let doomed: Vec<String> = table
            .by_user
            .get(user_id)
            .map(|ids| {
                ids.iter()
                    .filter(|id| id.as_str() != keep_session_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let removed = doomed
            .iter()
            .filter(|id| table.remove(id).is_some())
            .count();

        log::debug!("Revoked {} sessions for user {} keeping one", removed, user_id);
        Ok(removed)
    }

    async fn revoke_user(&self, user_id: &str) -> Result<usize> {
        let mut table = self.table.write().await;

        let doomed = table.by_user.get(user_id).cloned().unwrap_or_default();
        let removed = doomed
            .iter()
            .filter(|id| table.remove(id).is_some())
            .count();

        log::debug!("Revoked all {} sessions for user {}", removed, user_id);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.table.read().await.sessions.len())
    }

    async fn stats(&self) -> Result<SessionStats> {
        let table = self.table.read().await;
        Ok(SessionStats {
            total: table.sessions.len(),
            users: table.by_user.len(),
        })
    }
}

/// Shared reference to a session store
pub type SharedSessionStore = Arc<dyn SessionStore>;
