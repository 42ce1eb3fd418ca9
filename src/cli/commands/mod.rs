//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod activity;
pub mod config;
pub mod graph;
pub mod import;
pub mod stats;

use serde::Serialize;

use crate::analytics::SessionsMutator;
use crate::cli::{open_store, Cli, RangeArgs};
use crate::config::Config;
use crate::error::Result;
use crate::storage::SessionSource;

/// Load the sessions matching `range` from the selected database.
pub fn load_sessions(cli: &Cli, config: &Config, range: &RangeArgs, now: i64) -> Result<SessionsMutator> {
    let store = open_store(cli, config)?;
    let sessions = store.fetch_sessions(&range.to_query(now))?;
    Ok(SessionsMutator::new(sessions))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
