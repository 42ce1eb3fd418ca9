//! Statistics over closed sessions.
//!
//! This module provides:
//! - [`SessionsMutator`]: playtime, counts, distributions and per-day series
//! - [`PingMutator`] and [`TpsMutator`] for periodic samples
//! - The activity index ([`ActivityIndex`], [`ActivityIndexCalculator`])
//! - Geolocation counts
//!
//! Every aggregation reads its input without modifying it. Empty input
//! yields zero for sums and `None` for medians and averages.

pub mod activity;
pub mod geo;
pub mod ping;
pub mod tps;

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{FinishedSession, PlayerKill, WorldTimes};
use crate::util::time::{day_start, hour_of_day, weekday};

pub use activity::{activity_groups, ActivityIndex, ActivityIndexCalculator, ActivityLabel};
pub use geo::geolocation_counts;
pub use ping::PingMutator;
pub use tps::TpsMutator;

/// Median with the even/odd rule. `None` for empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Arithmetic mean. `None` for empty input.
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Kill and death totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KillCounts {
    /// Players killed.
    pub player_kills: usize,
    /// Mobs killed.
    pub mob_kills: u64,
    /// Deaths caused by players.
    pub player_deaths: usize,
    /// Deaths caused by anything else.
    pub environment_deaths: u64,
}

/// Summary of a session collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Number of sessions.
    pub sessions: usize,
    /// Distinct players.
    pub unique_players: usize,
    /// Sum of session lengths.
    pub total_playtime: i64,
    /// Sum of AFK time.
    pub total_afk_time: i64,
    /// Sum of active playtime.
    pub active_playtime: i64,
    /// Mean session length.
    pub average_session_length: i64,
    /// Median session length.
    pub median_session_length: Option<f64>,
    /// Length of the longest session.
    pub longest_session: Option<i64>,
    /// World with the most playtime.
    pub most_played_world: Option<String>,
    /// Kill and death totals.
    pub kills: KillCounts,
    /// Last session end.
    pub last_seen: Option<i64>,
}

/// Read-only view over closed sessions, ordered by start.
#[derive(Debug, Clone, Default)]
pub struct SessionsMutator {
    sessions: Vec<FinishedSession>,
}

impl SessionsMutator {
    /// Wrap sessions, sorting them by start.
    pub fn new(mut sessions: Vec<FinishedSession>) -> Self {
        sessions.sort_by_key(|s| (s.start(), s.player(), s.server()));
        Self { sessions }
    }

    /// Underlying sessions.
    pub fn sessions(&self) -> &[FinishedSession] {
        &self.sessions
    }

    /// Give back the sessions.
    pub fn into_inner(self) -> Vec<FinishedSession> {
        self.sessions
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions starting within `[after, before)`.
    #[must_use]
    pub fn filter_between(&self, after: i64, before: i64) -> Self {
        self.filter(|s| s.start() >= after && s.start() < before)
    }

    /// Sessions of one player.
    #[must_use]
    pub fn filter_player(&self, player: Uuid) -> Self {
        self.filter(|s| s.player() == player)
    }

    /// Sessions on one server.
    #[must_use]
    pub fn filter_server(&self, server: Uuid) -> Self {
        self.filter(|s| s.server() == server)
    }

    fn filter(&self, keep: impl Fn(&FinishedSession) -> bool) -> Self {
        Self {
            sessions: self.sessions.iter().filter(|s| keep(s)).cloned().collect(),
        }
    }

    /// Sum of session lengths.
    pub fn total_playtime(&self) -> i64 {
        self.sessions.iter().map(FinishedSession::length).sum()
    }

    /// Mean session length, 0 without sessions.
    pub fn average_session_length(&self) -> i64 {
        if self.sessions.is_empty() {
            0
        } else {
            self.total_playtime() / self.sessions.len() as i64
        }
    }

    /// Median session length.
    pub fn median_session_length(&self) -> Option<f64> {
        let lengths: Vec<f64> = self.sessions.iter().map(|s| s.length() as f64).collect();
        median(&lengths)
    }

    /// Number of sessions starting within `[after, before)`.
    pub fn session_count_between(&self, after: i64, before: i64) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.start() >= after && s.start() < before)
            .count()
    }

    /// Longest session, earliest start on ties.
    pub fn longest_session(&self) -> Option<&FinishedSession> {
        // Sorted by start, so keeping the first maximum breaks ties correctly
        self.sessions.iter().fold(None, |best, s| match best {
            Some(b) if FinishedSession::length(b) >= s.length() => Some(b),
            _ => Some(s),
        })
    }

    /// Sum of AFK time.
    pub fn total_afk_time(&self) -> i64 {
        self.sessions.iter().map(FinishedSession::afk_time).sum()
    }

    /// Sum of playtime minus AFK time.
    pub fn total_active_playtime(&self) -> i64 {
        self.sessions
            .iter()
            .map(FinishedSession::active_playtime)
            .sum()
    }

    /// World times of every session merged together.
    pub fn world_time_distribution(&self) -> WorldTimes {
        let mut total = WorldTimes::new();
        for session in &self.sessions {
            total.merge(session.world_times());
        }
        total
    }

    /// Kill and death totals.
    pub fn kill_counts(&self) -> KillCounts {
        self.sessions
            .iter()
            .fold(KillCounts::default(), |mut counts, s| {
                counts.player_kills += s.player_kills().len();
                counts.mob_kills += u64::from(s.mob_kills());
                counts.player_deaths += s.player_deaths().len();
                counts.environment_deaths += u64::from(s.environment_deaths());
                counts
            })
    }

    /// Every player kill, newest first.
    pub fn player_kills(&self) -> Vec<&PlayerKill> {
        let mut kills: Vec<&PlayerKill> = self
            .sessions
            .iter()
            .flat_map(|s| s.player_kills())
            .collect();
        kills.sort_by(|a, b| b.date.cmp(&a.date));
        kills
    }

    /// Distinct players.
    pub fn unique_players(&self) -> BTreeSet<Uuid> {
        self.sessions.iter().map(FinishedSession::player).collect()
    }

    /// Latest session end.
    pub fn last_seen(&self) -> Option<i64> {
        self.sessions.iter().map(FinishedSession::end).max()
    }

    /// Session count per day of session start.
    pub fn sessions_per_day(&self, utc_offset_minutes: i32) -> BTreeMap<i64, usize> {
        let mut days = BTreeMap::new();
        for session in &self.sessions {
            *days
                .entry(day_start(session.start(), utc_offset_minutes))
                .or_insert(0) += 1;
        }
        days
    }

    /// Playtime per day of session start.
    pub fn playtime_per_day(&self, utc_offset_minutes: i32) -> BTreeMap<i64, i64> {
        let mut days = BTreeMap::new();
        for session in &self.sessions {
            *days
                .entry(day_start(session.start(), utc_offset_minutes))
                .or_insert(0) += session.length();
        }
        days
    }

    /// Distinct players per day of session start.
    pub fn unique_players_per_day(&self, utc_offset_minutes: i32) -> BTreeMap<i64, usize> {
        let mut days: BTreeMap<i64, BTreeSet<Uuid>> = BTreeMap::new();
        for session in &self.sessions {
            days.entry(day_start(session.start(), utc_offset_minutes))
                .or_default()
                .insert(session.player());
        }
        days.into_iter()
            .map(|(day, players)| (day, players.len()))
            .collect()
    }

    /// Per-world playtime per day of session start, for stacked charts.
    pub fn world_time_per_day(&self, utc_offset_minutes: i32) -> BTreeMap<i64, BTreeMap<String, i64>> {
        let mut days: BTreeMap<i64, BTreeMap<String, i64>> = BTreeMap::new();
        for session in &self.sessions {
            let worlds = days
                .entry(day_start(session.start(), utc_offset_minutes))
                .or_default();
            for (world, gm_times) in session.world_times().iter() {
                *worlds.entry(world.to_string()).or_insert(0) += gm_times.total();
            }
        }
        days
    }

    /// Session starts per weekday (Monday first) and hour.
    pub fn punchcard(&self, utc_offset_minutes: i32) -> [[u32; 24]; 7] {
        let mut card = [[0u32; 24]; 7];
        for session in &self.sessions {
            let day = weekday(session.start(), utc_offset_minutes) as usize;
            let hour = hour_of_day(session.start(), utc_offset_minutes) as usize;
            card[day][hour] += 1;
        }
        card
    }

    /// Total playtime per player, most first.
    pub fn playtime_per_player(&self) -> IndexMap<Uuid, i64> {
        let mut totals: BTreeMap<Uuid, i64> = BTreeMap::new();
        for session in &self.sessions {
            *totals.entry(session.player()).or_insert(0) += session.length();
        }
        let mut sorted: Vec<(Uuid, i64)> = totals.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted.into_iter().collect()
    }

    /// Everything above in one serialisable value.
    pub fn summary(&self) -> SessionSummary {
        let worlds = self.world_time_distribution();
        SessionSummary {
            sessions: self.len(),
            unique_players: self.unique_players().len(),
            total_playtime: self.total_playtime(),
            total_afk_time: self.total_afk_time(),
            active_playtime: self.total_active_playtime(),
            average_session_length: self.average_session_length(),
            median_session_length: self.median_session_length(),
            longest_session: self.longest_session().map(FinishedSession::length),
            most_played_world: worlds.most_played_world().map(|(w, _)| w.to_string()),
            kills: self.kill_counts(),
            last_seen: self.last_seen(),
        }
    }
}

impl From<Vec<FinishedSession>> for SessionsMutator {
    fn from(sessions: Vec<FinishedSession>) -> Self {
        Self::new(sessions)
    }
}
