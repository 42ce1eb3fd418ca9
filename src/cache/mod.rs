//! Registry of open sessions.
//!
//! [`SessionCache`] is the single authority on whether a player currently has
//! an open session on a server. At most one [`ActiveSession`] exists per
//! (player, server) key. Every operation takes one lock around the whole map,
//! which is plenty for tens of events per second.
//!
//! Listeners must mutate live sessions through [`SessionCache::with_session`]
//! rather than holding on to a session; snapshots returned by
//! [`SessionCache::get_cached_session`] are copies.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{ActiveSession, FinishedSession, SessionKey};

/// Thread-safe map of open sessions keyed by (player, server).
#[derive(Debug, Default)]
pub struct SessionCache {
    inner: Mutex<HashMap<SessionKey, ActiveSession>>,
}

impl SessionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened session.
    ///
    /// If the key already holds an open session (a presence that ended without
    /// a quit event), that stale session is closed at the new session's start,
    /// or at the earliest instant it can legally end if that is later, and
    /// returned so the caller can persist it.
    pub fn cache_session(&self, session: ActiveSession) -> Option<FinishedSession> {
        let key = session.key();
        let new_start = session.start_time();
        let stale = self.inner.lock().insert(key, session);

        let mut stale = stale?;
        let end = new_start.max(stale.earliest_end());
        warn!(
            player = %key.player,
            server = %key.server,
            stale_start = stale.start_time(),
            end,
            "Replacing open session, closing the stale one"
        );
        match stale.end(end) {
            Ok(finished) => Some(finished),
            Err(e) => {
                error!(player = %key.player, error = %e, "Failed to close stale session");
                None
            }
        }
    }

    /// Snapshot of the open session for a key, if any.
    pub fn get_cached_session(&self, player: Uuid, server: Uuid) -> Option<ActiveSession> {
        self.inner
            .lock()
            .get(&SessionKey::new(player, server))
            .cloned()
    }

    /// Run `f` against the open session for a key while holding the lock.
    ///
    /// Returns `None` without calling `f` when no session is open.
    pub fn with_session<R>(
        &self,
        player: Uuid,
        server: Uuid,
        f: impl FnOnce(&mut ActiveSession) -> R,
    ) -> Option<R> {
        self.inner
            .lock()
            .get_mut(&SessionKey::new(player, server))
            .map(f)
    }

    /// Close and remove the open session for a key.
    ///
    /// Returns `Ok(None)` when no session is open. If closing fails (for
    /// example `timestamp` precedes the session start) the session stays open
    /// and the error is returned.
    pub fn end_session(
        &self,
        player: Uuid,
        server: Uuid,
        timestamp: i64,
    ) -> Result<Option<FinishedSession>> {
        let key = SessionKey::new(player, server);
        let mut sessions = self.inner.lock();
        let Some(session) = sessions.get_mut(&key) else {
            debug!(%player, %server, "No open session to end");
            return Ok(None);
        };
        let finished = session.end(timestamp)?;
        sessions.remove(&key);
        Ok(Some(finished))
    }

    /// Close every open session and clear the cache.
    ///
    /// Sessions are closed at `timestamp`, or at the earliest instant they can
    /// legally end if that is later.
    pub fn end_all_sessions(&self, timestamp: i64) -> Vec<FinishedSession> {
        let drained: Vec<ActiveSession> = {
            let mut sessions = self.inner.lock();
            sessions.drain().map(|(_, session)| session).collect()
        };

        let mut finished = Vec::with_capacity(drained.len());
        for mut session in drained {
            let end = timestamp.max(session.earliest_end());
            if end != timestamp {
                warn!(
                    player = %session.player(),
                    timestamp,
                    end,
                    "Shutdown time precedes session data, ending later"
                );
            }
            match session.end(end) {
                Ok(closed) => finished.push(closed),
                Err(e) => error!(player = %session.player(), error = %e, "Failed to close session"),
            }
        }
        finished.sort_by_key(|s| (s.start(), s.player(), s.server()));
        finished
    }

    /// Whether a session is open for the key.
    pub fn is_online(&self, player: Uuid, server: Uuid) -> bool {
        self.inner
            .lock()
            .contains_key(&SessionKey::new(player, server))
    }

    /// Keys of every open session.
    pub fn open_keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self.inner.lock().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Snapshots of every open session of one player, across servers.
    pub fn sessions_of(&self, player: Uuid) -> Vec<ActiveSession> {
        let mut sessions: Vec<ActiveSession> = self
            .inner
            .lock()
            .values()
            .filter(|s| s.player() == player)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.start_time(), s.server()));
        sessions
    }

    /// Players with an open session on a server.
    pub fn online_players(&self, server: Uuid) -> Vec<Uuid> {
        let players: BTreeSet<Uuid> = self
            .inner
            .lock()
            .keys()
            .filter(|key| key.server == server)
            .map(|key| key.player)
            .collect();
        players.into_iter().collect()
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Cache statistics.
    pub fn stats(&self) -> CacheStats {
        let sessions = self.inner.lock();
        let players: BTreeSet<Uuid> = sessions.keys().map(|key| key.player).collect();
        let servers: BTreeSet<Uuid> = sessions.keys().map(|key| key.server).collect();
        CacheStats {
            open_sessions: sessions.len(),
            players: players.len(),
            servers: servers.len(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of open sessions.
    pub open_sessions: usize,
    /// Distinct players with an open session.
    pub players: usize,
    /// Distinct servers with an open session.
    pub servers: usize,
}
