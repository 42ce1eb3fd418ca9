//! Core data structures.
//!
//! - [`ActiveSession`] / [`FinishedSession`]: one player's presence on one server
//! - [`WorldTimes`] / [`GmTimes`]: playtime per world and gamemode
//! - [`PingSample`], [`TpsSample`], [`GeoInfo`]: periodic measurements

pub mod samples;
pub mod session;
pub mod world_times;

pub use samples::{GeoInfo, PingSample, TpsSample};
pub use session::{
    ActiveSession, FinishedSession, PlayerDeath, PlayerKill, SessionKey, SessionRecord,
};
pub use world_times::{GmTimes, WorldTimes};
