//! Event entry point for platform listeners.
//!
//! [`ActivityTracker`] ties the [`SessionCache`], the [`AfkTracker`] and a
//! [`SessionSink`] together. Listeners call one method per game event; the
//! tracker stamps it with the injected [`Clock`], routes it to the right open
//! session and hands closed sessions to the sink.
//!
//! Events for players without an open session are expected (quit races with
//! shutdown, duplicated network events) and report `false` instead of an
//! error. Invariant violations come back as `Err` so the listener can log
//! and drop them.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::afk::{AfkCredit, AfkTracker};
use crate::cache::SessionCache;
use crate::config::AfkConfig;
use crate::error::Result;
use crate::model::{ActiveSession, FinishedSession};
use crate::storage::SessionSink;
use crate::util::time::Clock;

/// Routes game events into live sessions.
pub struct ActivityTracker {
    sessions: SessionCache,
    afk: AfkTracker,
    commands: Mutex<HashMap<Uuid, HashMap<String, u64>>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn SessionSink>,
}

impl std::fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityTracker")
            .field("sessions", &self.sessions)
            .field("afk", &self.afk)
            .finish_non_exhaustive()
    }
}

impl ActivityTracker {
    /// Create a tracker with the given AFK threshold.
    pub fn new(afk_threshold_ms: i64, clock: Arc<dyn Clock>, sink: Arc<dyn SessionSink>) -> Self {
        Self {
            sessions: SessionCache::new(),
            afk: AfkTracker::new(afk_threshold_ms),
            commands: Mutex::new(HashMap::new()),
            clock,
            sink,
        }
    }

    /// Create a tracker from the AFK configuration section.
    pub fn from_config(config: &AfkConfig, clock: Arc<dyn Clock>, sink: Arc<dyn SessionSink>) -> Self {
        Self::new(config.threshold_ms, clock, sink)
    }

    /// The open-session registry.
    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// The AFK tracker.
    pub fn afk(&self) -> &AfkTracker {
        &self.afk
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// A player joined a server.
    ///
    /// A session still open for the same key is closed and persisted first.
    /// The idle clock only restarts when no other session of the player is
    /// open, so pending AFK time on another server survives the join.
    pub fn player_joined(&self, player: Uuid, server: Uuid, world: &str, game_mode: &str) {
        let now = self.now();
        let elsewhere = self
            .sessions
            .sessions_of(player)
            .iter()
            .any(|s| s.server() != server);
        if !elsewhere {
            self.afk.reset(player, now);
        }
        let session = ActiveSession::start(player, server, now, world, game_mode);
        if let Some(stale) = self.sessions.cache_session(session) {
            self.persist(stale);
        }
        debug!(%player, %server, world, "Session started");
    }

    /// A player left a server. Returns whether a session was closed.
    pub fn player_left(&self, player: Uuid, server: Uuid) -> Result<bool> {
        let now = self.now();
        let elsewhere = self
            .sessions
            .sessions_of(player)
            .iter()
            .any(|s| s.server() != server);
        let credit = if elsewhere {
            self.afk.pending(player, now)
        } else {
            self.afk.logged_out(player, now)
        };
        self.credit_afk(player, server, credit, now);

        match self.sessions.end_session(player, server, now)? {
            Some(finished) => {
                self.persist(finished);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The player moved to another world. Counts as activity.
    pub fn world_changed(
        &self,
        player: Uuid,
        server: Uuid,
        world: &str,
        game_mode: &str,
    ) -> Result<bool> {
        let now = self.now();
        self.record_activity(player, server, now);
        self.sessions
            .with_session(player, server, |s| s.change_world(world, game_mode, now))
            .transpose()
            .map(|changed| changed.is_some())
    }

    /// The player switched gamemode in the current world. Counts as activity.
    pub fn game_mode_changed(&self, player: Uuid, server: Uuid, game_mode: &str) -> Result<bool> {
        let now = self.now();
        self.record_activity(player, server, now);
        self.sessions
            .with_session(player, server, |s| s.change_game_mode(game_mode, now))
            .transpose()
            .map(|changed| changed.is_some())
    }

    /// `killer` killed `victim` on `server`.
    ///
    /// The kill lands on the killer's session and the death on the victim's.
    /// Returns whether the killer had an open session.
    pub fn player_killed(&self, killer: Uuid, victim: Uuid, server: Uuid, weapon: &str) -> bool {
        let now = self.now();
        let recorded = self
            .sessions
            .with_session(killer, server, |s| s.player_killed(victim, weapon, now))
            .is_some();
        self.sessions
            .with_session(victim, server, |s| s.killed_by(killer, weapon, now));
        recorded
    }

    /// The player killed a mob.
    pub fn mob_killed(&self, player: Uuid, server: Uuid) -> bool {
        self.sessions
            .with_session(player, server, ActiveSession::mob_killed)
            .is_some()
    }

    /// The player died to something other than a player.
    pub fn died(&self, player: Uuid, server: Uuid) -> bool {
        self.sessions
            .with_session(player, server, ActiveSession::died)
            .is_some()
    }

    /// The player did something (moved, chatted, interacted).
    ///
    /// Any AFK period that just ended is credited to the session.
    pub fn activity(&self, player: Uuid, server: Uuid) -> bool {
        let now = self.now();
        self.record_activity(player, server, now);
        self.sessions.is_online(player, server)
    }

    /// The player declared themselves AFK.
    pub fn afk_command(&self, player: Uuid) {
        self.afk.used_afk_command(player, self.now());
    }

    /// The player is immune to AFK detection.
    pub fn ignore_afk(&self, player: Uuid) {
        self.afk.mark_ignored(player);
    }

    /// Count one use of `command` on `server`.
    pub fn command_used(&self, server: Uuid, command: &str) {
        let command = command.trim_start_matches('/').to_lowercase();
        *self
            .commands
            .lock()
            .entry(server)
            .or_default()
            .entry(command)
            .or_insert(0) += 1;
    }

    /// Command usage on a server, most used first, ties by name.
    pub fn command_usage(&self, server: Uuid) -> IndexMap<String, u64> {
        let mut usage: Vec<(String, u64)> = self
            .commands
            .lock()
            .get(&server)
            .map(|counts| counts.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        usage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        usage.into_iter().collect()
    }

    /// Close and persist every open session. Returns how many were closed.
    pub fn shutdown(&self) -> usize {
        let now = self.now();
        let keys = self.sessions.open_keys();
        for key in &keys {
            let credit = self.afk.pending(key.player, now);
            self.credit_afk(key.player, key.server, credit, now);
        }
        for key in &keys {
            self.afk.forget(key.player);
        }

        let finished = self.sessions.end_all_sessions(now);
        let count = finished.len();
        for session in finished {
            self.persist(session);
        }
        info!(count, "Saved open sessions on shutdown");
        count
    }

    fn record_activity(&self, player: Uuid, server: Uuid, now: i64) {
        let credit = self.afk.record_activity(player, now);
        self.credit_afk(player, server, credit, now);
    }

    fn credit_afk(&self, player: Uuid, server: Uuid, credit: AfkCredit, now: i64) {
        if credit <= 0 {
            return;
        }
        // Idle time from before this session started is not this session's
        self.sessions.with_session(player, server, |s| {
            let bounded = credit.min(s.length_at(now));
            debug!(%player, credit, bounded, "Crediting AFK time");
            s.add_afk(bounded);
        });
    }

    fn persist(&self, session: FinishedSession) {
        let player = session.player();
        if let Err(e) = self.sink.save_session(session) {
            error!(%player, error = %e, "Failed to hand off closed session");
        }
    }
}
