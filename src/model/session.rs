//! Open and closed player sessions.
//!
//! An [`ActiveSession`] is the mutable record of a player currently present on
//! a server. Calling [`ActiveSession::end`] moves everything it accumulated into
//! a [`FinishedSession`], which has no mutators and is what storage and the
//! analytics layer consume.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::world_times::WorldTimes;
use crate::error::{PlaystatError, Result};

/// Identity of a session slot: one player on one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Player UUID.
    pub player: Uuid,
    /// Server UUID.
    pub server: Uuid,
}

impl SessionKey {
    /// Create a new key.
    pub const fn new(player: Uuid, server: Uuid) -> Self {
        Self { player, server }
    }
}

/// A player killed by the session owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerKill {
    /// The killing player (session owner).
    pub killer: Uuid,
    /// The killed player.
    pub victim: Uuid,
    /// Weapon name as reported by the platform.
    pub weapon: String,
    /// When the kill happened.
    pub date: i64,
}

/// The session owner killed by another player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDeath {
    /// The killing player.
    pub killer: Uuid,
    /// Weapon name as reported by the platform.
    pub weapon: String,
    /// When the death happened.
    pub date: i64,
}

/// A session in progress.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    player: Uuid,
    server: Uuid,
    start: i64,
    world_times: WorldTimes,
    current_world: String,
    current_game_mode: String,
    last_change: i64,
    afk_time: i64,
    player_kills: Vec<PlayerKill>,
    player_deaths: Vec<PlayerDeath>,
    mob_kills: u32,
    environment_deaths: u32,
    closed: bool,
}

impl ActiveSession {
    /// Open a session for `player` on `server` at `timestamp`.
    pub fn start(
        player: Uuid,
        server: Uuid,
        timestamp: i64,
        world: impl Into<String>,
        game_mode: impl Into<String>,
    ) -> Self {
        Self {
            player,
            server,
            start: timestamp,
            world_times: WorldTimes::new(),
            current_world: world.into(),
            current_game_mode: game_mode.into(),
            last_change: timestamp,
            afk_time: 0,
            player_kills: Vec::new(),
            player_deaths: Vec::new(),
            mob_kills: 0,
            environment_deaths: 0,
            closed: false,
        }
    }

    /// Player this session belongs to.
    pub fn player(&self) -> Uuid {
        self.player
    }

    /// Server this session is recorded on.
    pub fn server(&self) -> Uuid {
        self.server
    }

    /// Cache key of this session.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.player, self.server)
    }

    /// Session start in epoch milliseconds.
    pub fn start_time(&self) -> i64 {
        self.start
    }

    /// World the player is currently in.
    pub fn current_world(&self) -> &str {
        &self.current_world
    }

    /// Gamemode the player is currently in.
    pub fn current_game_mode(&self) -> &str {
        &self.current_game_mode
    }

    /// AFK time accumulated so far.
    pub fn afk_time(&self) -> i64 {
        self.afk_time
    }

    /// Player kills recorded so far.
    pub fn player_kills(&self) -> &[PlayerKill] {
        &self.player_kills
    }

    /// Deaths caused by other players recorded so far.
    pub fn player_deaths(&self) -> &[PlayerDeath] {
        &self.player_deaths
    }

    /// Mob kills recorded so far.
    pub fn mob_kills(&self) -> u32 {
        self.mob_kills
    }

    /// Deaths not caused by a player recorded so far.
    pub fn environment_deaths(&self) -> u32 {
        self.environment_deaths
    }

    /// Whether [`end`](Self::end) has already succeeded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Earliest timestamp [`end`](Self::end) accepts.
    pub fn earliest_end(&self) -> i64 {
        self.start.max(self.last_change)
    }

    /// Length of the session as of `now`; zero if `now` precedes the start.
    pub fn length_at(&self, now: i64) -> i64 {
        (now - self.start).max(0)
    }

    /// World times including the still-open bucket credited up to `now`.
    pub fn world_times_at(&self, now: i64) -> WorldTimes {
        let mut times = self.world_times.clone();
        times.add(
            &self.current_world,
            &self.current_game_mode,
            now - self.last_change,
        );
        times
    }

    /// Close the current world/gamemode bucket at `timestamp` and open a new one.
    pub fn change_world(
        &mut self,
        world: impl Into<String>,
        game_mode: impl Into<String>,
        timestamp: i64,
    ) -> Result<()> {
        self.ensure_open()?;
        if timestamp < self.last_change {
            return Err(PlaystatError::invalid_timestamp(
                timestamp,
                format!("world change before previous change at {}", self.last_change),
            ));
        }
        self.world_times.add(
            &self.current_world,
            &self.current_game_mode,
            timestamp - self.last_change,
        );
        self.current_world = world.into();
        self.current_game_mode = game_mode.into();
        self.last_change = timestamp;
        Ok(())
    }

    /// Switch gamemode without leaving the current world.
    pub fn change_game_mode(&mut self, game_mode: impl Into<String>, timestamp: i64) -> Result<()> {
        let world = self.current_world.clone();
        self.change_world(world, game_mode, timestamp)
    }

    /// Add AFK time. Negative amounts are clamped to zero.
    pub fn add_afk(&mut self, duration_ms: i64) {
        if self.closed {
            debug!(player = %self.player, "Ignoring AFK time for closed session");
            return;
        }
        self.afk_time += duration_ms.max(0);
    }

    /// Record that the session owner killed `victim`.
    pub fn player_killed(&mut self, victim: Uuid, weapon: impl Into<String>, timestamp: i64) {
        if self.closed {
            debug!(player = %self.player, "Ignoring kill for closed session");
            return;
        }
        self.player_kills.push(PlayerKill {
            killer: self.player,
            victim,
            weapon: weapon.into(),
            date: timestamp,
        });
    }

    /// Record that the session owner was killed by `killer`.
    pub fn killed_by(&mut self, killer: Uuid, weapon: impl Into<String>, timestamp: i64) {
        if self.closed {
            debug!(player = %self.player, "Ignoring death for closed session");
            return;
        }
        self.player_deaths.push(PlayerDeath {
            killer,
            weapon: weapon.into(),
            date: timestamp,
        });
    }

    /// Record a mob kill.
    pub fn mob_killed(&mut self) {
        if !self.closed {
            self.mob_kills += 1;
        }
    }

    /// Record a death not caused by another player.
    pub fn died(&mut self) {
        if !self.closed {
            self.environment_deaths += 1;
        }
    }

    /// Close the session at `timestamp`.
    ///
    /// The accumulated data moves into the returned [`FinishedSession`]; this
    /// session is left closed and empty.
    pub fn end(&mut self, timestamp: i64) -> Result<FinishedSession> {
        self.ensure_open()?;
        if timestamp < self.start {
            return Err(PlaystatError::invalid_timestamp(
                timestamp,
                format!("session end before start at {}", self.start),
            ));
        }
        if timestamp < self.last_change {
            return Err(PlaystatError::invalid_timestamp(
                timestamp,
                format!("session end before last world change at {}", self.last_change),
            ));
        }

        self.world_times.add(
            &self.current_world,
            &self.current_game_mode,
            timestamp - self.last_change,
        );
        self.last_change = timestamp;

        let length = timestamp - self.start;
        if self.afk_time > length {
            warn!(
                player = %self.player,
                afk_time = self.afk_time,
                length,
                "AFK time exceeds session length, capping"
            );
            self.afk_time = length;
        }

        self.closed = true;
        debug!(player = %self.player, server = %self.server, length, "Session closed");

        Ok(FinishedSession {
            player: self.player,
            server: self.server,
            start: self.start,
            end: timestamp,
            afk_time: std::mem::take(&mut self.afk_time),
            world_times: std::mem::take(&mut self.world_times),
            player_kills: std::mem::take(&mut self.player_kills),
            player_deaths: std::mem::take(&mut self.player_deaths),
            mob_kills: std::mem::take(&mut self.mob_kills),
            environment_deaths: std::mem::take(&mut self.environment_deaths),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(PlaystatError::SessionAlreadyClosed {
                player: self.player,
                server: self.server,
            })
        } else {
            Ok(())
        }
    }
}

/// Plain, serialisable form of a closed session.
///
/// Used by storage backends and JSON import/export; converting it into a
/// [`FinishedSession`] validates the session invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Player UUID.
    pub player: Uuid,
    /// Server UUID.
    pub server: Uuid,
    /// Session start.
    pub start: i64,
    /// Session end.
    pub end: i64,
    /// AFK time.
    #[serde(default)]
    pub afk_time: i64,
    /// Per-world, per-gamemode playtime.
    #[serde(default)]
    pub world_times: WorldTimes,
    /// Players killed by the owner.
    #[serde(default)]
    pub player_kills: Vec<PlayerKill>,
    /// Deaths caused by other players.
    #[serde(default)]
    pub player_deaths: Vec<PlayerDeath>,
    /// Mob kills.
    #[serde(default)]
    pub mob_kills: u32,
    /// Deaths not caused by players.
    #[serde(default)]
    pub environment_deaths: u32,
}

/// A closed, immutable session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord", into = "SessionRecord")]
pub struct FinishedSession {
    player: Uuid,
    server: Uuid,
    start: i64,
    end: i64,
    afk_time: i64,
    world_times: WorldTimes,
    player_kills: Vec<PlayerKill>,
    player_deaths: Vec<PlayerDeath>,
    mob_kills: u32,
    environment_deaths: u32,
}

impl FinishedSession {
    /// Player this session belongs to.
    pub fn player(&self) -> Uuid {
        self.player
    }

    /// Server this session was recorded on.
    pub fn server(&self) -> Uuid {
        self.server
    }

    /// Cache key of this session.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.player, self.server)
    }

    /// Session start.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Session end.
    pub fn end(&self) -> i64 {
        self.end
    }

    /// `end - start`.
    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    /// AFK time within the session.
    pub fn afk_time(&self) -> i64 {
        self.afk_time
    }

    /// Length minus AFK time.
    pub fn active_playtime(&self) -> i64 {
        self.length() - self.afk_time
    }

    /// Per-world, per-gamemode playtime.
    pub fn world_times(&self) -> &WorldTimes {
        &self.world_times
    }

    /// Players killed by the owner.
    pub fn player_kills(&self) -> &[PlayerKill] {
        &self.player_kills
    }

    /// Deaths caused by other players.
    pub fn player_deaths(&self) -> &[PlayerDeath] {
        &self.player_deaths
    }

    /// Mob kills.
    pub fn mob_kills(&self) -> u32 {
        self.mob_kills
    }

    /// Deaths not caused by players.
    pub fn environment_deaths(&self) -> u32 {
        self.environment_deaths
    }

    /// Convert into the plain record form.
    pub fn into_record(self) -> SessionRecord {
        self.into()
    }
}

impl TryFrom<SessionRecord> for FinishedSession {
    type Error = PlaystatError;

    fn try_from(record: SessionRecord) -> Result<Self> {
        if record.end < record.start {
            return Err(PlaystatError::invalid_timestamp(
                record.end,
                format!("session end before start at {}", record.start),
            ));
        }
        let length = record.end.checked_sub(record.start).ok_or_else(|| {
            PlaystatError::invalid_argument(
                "end",
                format!("session from {} to {} is too long", record.start, record.end),
            )
        })?;
        if record.afk_time < 0 || record.afk_time > length {
            return Err(PlaystatError::invalid_argument(
                "afk_time",
                format!("{} is outside 0..={length}", record.afk_time),
            ));
        }
        if record.world_times.has_negative() || record.world_times.total() > length {
            return Err(PlaystatError::invalid_argument(
                "world_times",
                format!("total {} exceeds session length {length}", record.world_times.total()),
            ));
        }
        Ok(Self {
            player: record.player,
            server: record.server,
            start: record.start,
            end: record.end,
            afk_time: record.afk_time,
            world_times: record.world_times,
            player_kills: record.player_kills,
            player_deaths: record.player_deaths,
            mob_kills: record.mob_kills,
            environment_deaths: record.environment_deaths,
        })
    }
}

impl From<FinishedSession> for SessionRecord {
    fn from(session: FinishedSession) -> Self {
        Self {
            player: session.player,
            server: session.server,
            start: session.start,
            end: session.end,
            afk_time: session.afk_time,
            world_times: session.world_times,
            player_kills: session.player_kills,
            player_deaths: session.player_deaths,
            mob_kills: session.mob_kills,
            environment_deaths: session.environment_deaths,
        }
    }
}
