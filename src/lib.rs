//! playstat: player session tracking and activity analytics for game servers.
//!
//! The crate turns a stream of gameplay events (joins, leaves, world and
//! gamemode changes, kills, deaths, AFK signals) into closed session records,
//! persists them, and derives statistics and chart-ready series from them.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use playstat::prelude::*;
//! use uuid::Uuid;
//!
//! fn main() -> playstat::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let tracker = ActivityTracker::new(
//!         DEFAULT_AFK_THRESHOLD_MS,
//!         Arc::new(SystemClock),
//!         store.clone(),
//!     );
//!
//!     let (player, server) = (Uuid::new_v4(), Uuid::new_v4());
//!     tracker.player_joined(player, server, "world", "SURVIVAL");
//!     tracker.player_left(player, server)?;
//!
//!     let sessions = SessionsMutator::new(store.fetch_sessions(&SessionQuery::all())?);
//!     println!("{} ms played", sessions.total_playtime());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`model`]: sessions, world times and periodic samples
//! - [`cache`]: open sessions keyed by (player, server)
//! - [`afk`]: idle detection and AFK credit
//! - [`tracker`]: event facade tying the cache, AFK tracker and storage together
//! - [`storage`]: session sinks and sources (SQLite, in-memory, async queue)
//! - [`analytics`]: aggregation over closed sessions and the activity index
//! - [`graph`]: plottable series built from aggregates
//! - [`config`]: configuration management
//! - [`cli`]: command-line interface
//! - [`error`]: error types and handling

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod afk;
pub mod analytics;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod storage;
pub mod tracker;
pub mod util;

// Re-export commonly used types at the crate root
pub use error::{PlaystatError, Result};
pub use model::{ActiveSession, FinishedSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::afk::{AfkTracker, DEFAULT_AFK_THRESHOLD_MS};
    pub use crate::analytics::{ActivityIndex, ActivityIndexCalculator, ActivityLabel, SessionsMutator};
    pub use crate::cache::SessionCache;
    pub use crate::config::Config;
    pub use crate::error::{PlaystatError, Result};
    pub use crate::model::{ActiveSession, FinishedSession, WorldTimes};
    pub use crate::storage::{MemoryStore, SessionQuery, SessionSink, SessionSource, SqliteStore};
    pub use crate::tracker::ActivityTracker;
    pub use crate::util::time::{Clock, ManualClock, SystemClock};
}
