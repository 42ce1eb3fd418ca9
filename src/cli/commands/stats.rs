//! Stats command implementation.
//!
//! Summarises the sessions matching a filter: totals, averages, kills and the
//! most played world, optionally followed by the top players by playtime.

use serde::Serialize;

use crate::analytics::SessionSummary;
use crate::cli::{now_ms, Cli, OutputFormat, StatsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::graph::{to_bars, Bar};
use crate::util::time::{format_date, format_duration};

use super::{load_sessions, print_json};

#[derive(Debug, Serialize)]
struct StatsReport {
    #[serde(flatten)]
    summary: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_players: Option<Vec<Bar>>,
}

/// Run the stats command.
pub fn run(cli: &Cli, config: &Config, args: &StatsArgs) -> Result<()> {
    let sessions = load_sessions(cli, config, &args.range, now_ms())?;
    let summary = sessions.summary();

    let top_players = args.top.then(|| {
        let per_player = sessions.playtime_per_player();
        to_bars(
            per_player
                .into_iter()
                .map(|(player, ms)| (player.to_string(), u64::try_from(ms).unwrap_or(0))),
            config.graph.top_n,
        )
    });

    let report = StatsReport {
        summary,
        top_players,
    };

    match cli.effective_output() {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_text(&report, config.time.utc_offset_minutes);
            Ok(())
        }
    }
}

fn print_text(report: &StatsReport, utc_offset_minutes: i32) {
    let s = &report.summary;
    if s.sessions == 0 {
        println!("No sessions found.");
        return;
    }

    println!("Session Statistics");
    println!("==================\n");
    println!("  Sessions:          {}", s.sessions);
    println!("  Unique players:    {}", s.unique_players);
    println!("  Total playtime:    {}", format_duration(s.total_playtime));
    println!("  Active playtime:   {}", format_duration(s.active_playtime));
    println!("  AFK time:          {}", format_duration(s.total_afk_time));
    println!(
        "  Average session:   {}",
        format_duration(s.average_session_length)
    );
    if let Some(median) = s.median_session_length {
        println!("  Median session:    {}", format_duration(median as i64));
    }
    if let Some(longest) = s.longest_session {
        println!("  Longest session:   {}", format_duration(longest));
    }
    if let Some(world) = &s.most_played_world {
        println!("  Most played world: {world}");
    }
    if let Some(last) = s.last_seen {
        println!("  Last seen:         {}", format_date(last, utc_offset_minutes));
    }

    println!();
    println!("Kills");
    println!("-----");
    println!("  Player kills:       {}", s.kills.player_kills);
    println!("  Mob kills:          {}", s.kills.mob_kills);
    println!("  Player deaths:      {}", s.kills.player_deaths);
    println!("  Environment deaths: {}", s.kills.environment_deaths);

    if let Some(top) = &report.top_players {
        println!();
        println!("Top Players");
        println!("-----------");
        for (rank, bar) in top.iter().enumerate() {
            println!(
                "  {:>2}. {}  {}",
                rank + 1,
                bar.label,
                format_duration(bar.value as i64)
            );
        }
    }
}
