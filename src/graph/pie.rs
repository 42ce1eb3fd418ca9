//! World playtime pie with gamemode drilldown.

use serde::Serialize;

use super::color_at;
use crate::model::WorldTimes;

/// One world's slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    /// World name.
    pub name: String,
    /// Milliseconds in the world.
    pub value: i64,
    /// Share of the whole pie in percent.
    pub percentage: f64,
    /// Display color.
    pub color: String,
    /// Milliseconds per gamemode within the world.
    pub drilldown: Vec<(String, i64)>,
}

/// Slices ordered by time descending, world name on ties.
pub fn to_pie(world_times: &WorldTimes, colors: &[String]) -> Vec<PieSlice> {
    let total = world_times.total();
    let mut worlds: Vec<(&str, i64)> = world_times
        .iter()
        .map(|(world, gm)| (world, gm.total()))
        .collect();
    worlds.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    worlds
        .into_iter()
        .enumerate()
        .map(|(i, (world, value))| PieSlice {
            name: world.to_string(),
            value,
            percentage: if total > 0 {
                value as f64 * 100.0 / total as f64
            } else {
                0.0
            },
            color: color_at(colors, i),
            drilldown: world_times
                .world(world)
                .map(|gm| gm.iter().map(|(mode, ms)| (mode.to_string(), ms)).collect())
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slices() {
        let mut times = WorldTimes::new();
        times.add("world", "SURVIVAL", 300);
        times.add("world", "CREATIVE", 100);
        times.add("nether", "SURVIVAL", 100);

        let pie = to_pie(&times, &[]);
        assert_eq!(pie.len(), 2);
        assert_eq!(pie[0].name, "world");
        assert_eq!(pie[0].percentage, 80.0);
        assert_eq!(
            pie[0].drilldown,
            vec![("CREATIVE".to_string(), 100), ("SURVIVAL".to_string(), 300)]
        );
        assert_eq!(pie[1].percentage, 20.0);
    }

    #[test]
    fn test_empty() {
        assert!(to_pie(&WorldTimes::new(), &[]).is_empty());
    }
}
