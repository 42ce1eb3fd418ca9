//! Periodic measurements collected alongside sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ping measurement window for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingSample {
    /// End of the measurement window.
    pub date: i64,
    /// Server the ping was measured on.
    pub server: Uuid,
    /// Average ping within the window, in milliseconds.
    pub average: f64,
    /// Lowest ping within the window.
    pub min: i32,
    /// Highest ping within the window.
    pub max: i32,
}

/// One server performance sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpsSample {
    /// When the sample was taken.
    pub date: i64,
    /// Ticks per second.
    pub tps: f64,
    /// Players online.
    pub players_online: u32,
    /// CPU usage percentage, negative when unavailable.
    #[serde(default = "unavailable")]
    pub cpu_usage: f64,
    /// Used memory in megabytes.
    #[serde(default)]
    pub ram_usage_mb: u64,
    /// Loaded entities.
    #[serde(default)]
    pub entities: u32,
    /// Loaded chunks.
    #[serde(default)]
    pub chunks_loaded: u32,
}

fn unavailable() -> f64 {
    -1.0
}

/// Geolocation of a player at some point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    /// Player UUID.
    pub player: Uuid,
    /// Country name.
    pub country: String,
    /// When the location was last seen.
    pub date: i64,
}
