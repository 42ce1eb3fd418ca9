//! Activity command implementation.
//!
//! Computes the activity index of one player or of every player in the
//! database at a reference date. Players are scored in parallel.

use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::activity::{activity_groups, ActivityIndex, ActivityIndexCalculator};
use crate::analytics::SessionsMutator;
use crate::cli::{now_ms, open_store, ActivityArgs, Cli, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{SessionQuery, SessionSource};
use crate::util::time::DAY;

use super::print_json;

#[derive(Debug, Serialize)]
struct PlayerActivity {
    player: Uuid,
    #[serde(flatten)]
    index: ActivityIndex,
}

/// Run the activity command.
pub fn run(cli: &Cli, config: &Config, args: &ActivityArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(now_ms);
    let store = open_store(cli, config)?;

    let activity = &config.activity;
    let window = i64::from(activity.period_days) * DAY * activity.periods as i64;
    let mut query = SessionQuery::all().between(date - window, date);
    if let Some(player) = args.player {
        query = query.player(player);
    }
    let sessions = SessionsMutator::new(store.fetch_sessions(&query)?);

    // Players without sessions in the window still get an (inactive) index.
    let players: Vec<Uuid> = match args.player {
        Some(player) => vec![player],
        None => store.player_ids()?,
    };

    let calculator = ActivityIndexCalculator::new(activity.clone());
    let mut results: Vec<PlayerActivity> = players
        .par_iter()
        .map(|&player| PlayerActivity {
            player,
            index: calculator.index_for(player, date, sessions.sessions()),
        })
        .collect();
    results.sort_by(|a, b| {
        b.index
            .value
            .total_cmp(&a.index.value)
            .then_with(|| a.player.cmp(&b.player))
    });

    if args.groups {
        let groups = activity_groups(results.iter().map(|r| &r.index));
        return match cli.effective_output() {
            OutputFormat::Json => print_json(&groups),
            OutputFormat::Text => {
                for (label, count) in &groups {
                    println!("  {:<12} {count}", label.as_str());
                }
                Ok(())
            }
        };
    }

    match cli.effective_output() {
        OutputFormat::Json => print_json(&results),
        OutputFormat::Text => {
            if results.is_empty() {
                println!("No players found.");
            }
            for entry in &results {
                println!(
                    "  {}  {:.2}  {}",
                    entry.player, entry.index.value, entry.index.label
                );
            }
            Ok(())
        }
    }
}
