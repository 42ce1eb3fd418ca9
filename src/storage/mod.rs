//! Persistence of closed sessions.
//!
//! The core only needs two narrow interfaces: a [`SessionSink`] that accepts
//! closed sessions and a [`SessionSource`] that returns them for a
//! [`SessionQuery`]. Backends:
//!
//! - [`MemoryStore`]: in-process, used by tests and short-lived tools
//! - [`SqliteStore`]: on-disk database
//! - [`PersistenceQueue`]: fire-and-forget hand-off to a background worker
//!   writing into any other sink
//!
//! Saving must be idempotent on (player, server, start) because a session
//! may be replayed after a crash.

pub mod queue;
pub mod sqlite;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::model::FinishedSession;

pub use queue::{PersistenceQueue, PersistenceStats, PersistenceWorker};
pub use sqlite::SqliteStore;

/// Accepts closed sessions.
pub trait SessionSink: Send + Sync {
    /// Persist one closed session. Saving the same session twice stores it once.
    fn save_session(&self, session: FinishedSession) -> Result<()>;
}

/// Returns stored sessions.
pub trait SessionSource: Send + Sync {
    /// Sessions matching `query`, ordered by start.
    fn fetch_sessions(&self, query: &SessionQuery) -> Result<Vec<FinishedSession>>;
}

impl<T: SessionSink + ?Sized> SessionSink for Arc<T> {
    fn save_session(&self, session: FinishedSession) -> Result<()> {
        (**self).save_session(session)
    }
}

impl<T: SessionSource + ?Sized> SessionSource for Arc<T> {
    fn fetch_sessions(&self, query: &SessionQuery) -> Result<Vec<FinishedSession>> {
        (**self).fetch_sessions(query)
    }
}

/// Session filter: optional player and server, start within `[after, before)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionQuery {
    /// Only sessions of this player.
    pub player: Option<Uuid>,
    /// Only sessions on this server.
    pub server: Option<Uuid>,
    /// Inclusive lower bound on session start.
    pub after: i64,
    /// Exclusive upper bound on session start.
    pub before: i64,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self::all()
    }
}

impl SessionQuery {
    /// Match every session.
    pub const fn all() -> Self {
        Self {
            player: None,
            server: None,
            after: i64::MIN,
            before: i64::MAX,
        }
    }

    /// Restrict to one player.
    #[must_use]
    pub const fn player(mut self, player: Uuid) -> Self {
        self.player = Some(player);
        self
    }

    /// Restrict to one server.
    #[must_use]
    pub const fn server(mut self, server: Uuid) -> Self {
        self.server = Some(server);
        self
    }

    /// Restrict session starts to `[after, before)`.
    #[must_use]
    pub const fn between(mut self, after: i64, before: i64) -> Self {
        self.after = after;
        self.before = before;
        self
    }

    /// Whether `session` satisfies this query.
    pub fn matches(&self, session: &FinishedSession) -> bool {
        self.player.map_or(true, |p| p == session.player())
            && self.server.map_or(true, |s| s == session.server())
            && session.start() >= self.after
            && session.start() < self.before
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // Keyed by (start, player, server) so iteration is chronological
    sessions: RwLock<BTreeMap<(i64, Uuid, Uuid), FinishedSession>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionSink for MemoryStore {
    fn save_session(&self, session: FinishedSession) -> Result<()> {
        let key = (session.start(), session.player(), session.server());
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&key) {
            debug!(player = %key.1, start = key.0, "Session already stored, skipping");
            return Ok(());
        }
        sessions.insert(key, session);
        Ok(())
    }
}

impl SessionSource for MemoryStore {
    fn fetch_sessions(&self, query: &SessionQuery) -> Result<Vec<FinishedSession>> {
        Ok(self
            .sessions
            .read()
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect())
    }
}
