//! Graph command implementation.
//!
//! Builds chart-ready series from the sessions matching a filter and prints
//! them as JSON.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::analytics::SessionsMutator;
use crate::cli::{now_ms, Cli, GraphArgs, GraphKind};
use crate::config::Config;
use crate::error::{PlaystatError, Result};
use crate::graph::{fill_missing, simplify, to_bars, to_pie, to_points, to_stacked_series, Point, StackGraph};
use crate::util::time::day_buckets;

use super::{load_sessions, print_json};

/// Run the graph command.
pub fn run(cli: &Cli, config: &Config, args: &GraphArgs) -> Result<()> {
    let epsilon = args.epsilon.unwrap_or(config.graph.epsilon);
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(PlaystatError::invalid_argument(
            "epsilon",
            "must be a non-negative number",
        ));
    }

    let sessions = load_sessions(cli, config, &args.range, now_ms())?;
    let offset = config.time.utc_offset_minutes;
    let colors = &config.graph.colors;

    match args.kind {
        GraphKind::Playtime => {
            let series = sessions
                .playtime_per_day(offset)
                .into_iter()
                .map(|(day, ms)| (day, ms as f64));
            print_line(series, config, args, epsilon)
        }
        GraphKind::Sessions => {
            let series = sessions
                .sessions_per_day(offset)
                .into_iter()
                .map(|(day, count)| (day, count as f64));
            print_line(series, config, args, epsilon)
        }
        GraphKind::Players => {
            let series = sessions
                .unique_players_per_day(offset)
                .into_iter()
                .map(|(day, count)| (day, count as f64));
            print_line(series, config, args, epsilon)
        }
        GraphKind::Worlds => print_json(&world_stack(&sessions, offset, colors, args.no_fill)),
        GraphKind::Pie => print_json(&to_pie(&sessions.world_time_distribution(), colors)),
        GraphKind::Punchcard => print_json(&json!({
            "punchcard": sessions.punchcard(offset),
        })),
        GraphKind::Top => {
            let bars = to_bars(
                sessions
                    .playtime_per_player()
                    .into_iter()
                    .map(|(player, ms)| (player.to_string(), u64::try_from(ms).unwrap_or(0))),
                config.graph.top_n,
            );
            print_json(&bars)
        }
    }
}

#[derive(Debug, Serialize)]
struct LineGraph {
    points: Vec<Point>,
}

fn print_line<I>(series: I, config: &Config, args: &GraphArgs, epsilon: f64) -> Result<()>
where
    I: IntoIterator<Item = (i64, f64)>,
{
    let mut points = to_points(series);
    if !args.no_fill {
        points = fill_missing(&points, config.graph.gap_accuracy_ms, 0.0);
    }
    let points = simplify(&points, epsilon);
    print_json(&LineGraph { points })
}

/// Per-world playtime per day, worlds ordered by total playtime.
fn world_stack(
    sessions: &SessionsMutator,
    offset: i32,
    colors: &[String],
    no_fill: bool,
) -> StackGraph {
    let mut per_day = sessions.world_time_per_day(offset);

    let bounds = per_day.keys().next().copied().zip(per_day.keys().next_back().copied());
    if let (false, Some((first, last))) = (no_fill, bounds) {
        for day in day_buckets(first, last + 1, offset) {
            per_day.entry(day).or_default();
        }
    }

    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for worlds in per_day.values() {
        for (world, ms) in worlds {
            *totals.entry(world.clone()).or_insert(0) += ms;
        }
    }
    let mut names: Vec<(String, i64)> = totals.into_iter().collect();
    names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let names: Vec<String> = names.into_iter().map(|(name, _)| name).collect();

    to_stacked_series(&per_day, &names, colors)
}
