//! Per-world, per-gamemode playtime accumulators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Milliseconds spent in each gamemode of a single world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GmTimes {
    times: BTreeMap<String, i64>,
}

impl GmTimes {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ms` to a gamemode. Non-positive amounts are ignored.
    pub fn add(&mut self, game_mode: &str, ms: i64) {
        if ms <= 0 {
            return;
        }
        *self.times.entry(game_mode.to_string()).or_insert(0) += ms;
    }

    /// Time spent in one gamemode.
    pub fn get(&self, game_mode: &str) -> i64 {
        self.times.get(game_mode).copied().unwrap_or(0)
    }

    /// Time spent across all gamemodes.
    pub fn total(&self) -> i64 {
        self.times.values().sum()
    }

    /// Iterate over `(gamemode, ms)` pairs in gamemode order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.times.iter().map(|(gm, ms)| (gm.as_str(), *ms))
    }

    /// Add every entry of `other` into this accumulator.
    pub fn merge(&mut self, other: &GmTimes) {
        for (gm, ms) in other.iter() {
            self.add(gm, ms);
        }
    }

    /// Whether no time has been recorded.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Milliseconds spent per world, broken down by gamemode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldTimes {
    worlds: BTreeMap<String, GmTimes>,
}

impl WorldTimes {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ms` to a world/gamemode pair. Non-positive amounts are ignored.
    pub fn add(&mut self, world: &str, game_mode: &str, ms: i64) {
        if ms <= 0 {
            return;
        }
        self.worlds
            .entry(world.to_string())
            .or_default()
            .add(game_mode, ms);
    }

    /// Time spent in one world/gamemode pair.
    pub fn get(&self, world: &str, game_mode: &str) -> i64 {
        self.worlds.get(world).map_or(0, |gm| gm.get(game_mode))
    }

    /// Gamemode breakdown of one world.
    pub fn world(&self, world: &str) -> Option<&GmTimes> {
        self.worlds.get(world)
    }

    /// Time spent in one world across all gamemodes.
    pub fn world_total(&self, world: &str) -> i64 {
        self.worlds.get(world).map_or(0, GmTimes::total)
    }

    /// Time spent in all worlds.
    pub fn total(&self) -> i64 {
        self.worlds.values().map(GmTimes::total).sum()
    }

    /// Iterate over `(world, gamemodes)` pairs in world order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GmTimes)> {
        self.worlds.iter().map(|(world, gm)| (world.as_str(), gm))
    }

    /// Sum gamemode times over all worlds.
    pub fn gamemode_totals(&self) -> BTreeMap<String, i64> {
        let mut totals = BTreeMap::new();
        for gm_times in self.worlds.values() {
            for (gm, ms) in gm_times.iter() {
                *totals.entry(gm.to_string()).or_insert(0) += ms;
            }
        }
        totals
    }

    /// The world with the most time, earliest world name on ties.
    pub fn most_played_world(&self) -> Option<(&str, i64)> {
        self.worlds
            .iter()
            .map(|(world, gm)| (world.as_str(), gm.total()))
            .fold(None, |best: Option<(&str, i64)>, (world, total)| match best {
                Some((_, best_total)) if best_total >= total => best,
                _ => Some((world, total)),
            })
    }

    /// Add every entry of `other` into this accumulator.
    pub fn merge(&mut self, other: &WorldTimes) {
        for (world, gm_times) in &other.worlds {
            self.worlds.entry(world.clone()).or_default().merge(gm_times);
        }
    }

    /// Whether no time has been recorded.
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Whether any recorded value is negative.
    pub(crate) fn has_negative(&self) -> bool {
        self.worlds
            .values()
            .any(|gm| gm.times.values().any(|ms| *ms < 0))
    }
}
