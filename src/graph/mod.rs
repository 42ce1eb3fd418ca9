//! Plottable series built from aggregates.
//!
//! Everything here is a pure view transform: inputs are aggregation results,
//! outputs are plain serialisable values ([`Point`], [`Bar`], [`StackGraph`],
//! [`PieSlice`]) built fresh per request.

pub mod bar;
pub mod line;
pub mod pie;
pub mod stack;

use serde::{Deserialize, Serialize};

pub use bar::{to_bars, Bar};
pub use line::{fill_missing, simplify, to_points};
pub use pie::{to_pie, PieSlice};
pub use stack::{to_stacked_series, StackDataSet, StackGraph};

/// Colors assigned to series when the caller supplies none.
pub const DEFAULT_COLORS: [&str; 8] = [
    "#4caf50", "#2196f3", "#ff9800", "#9c27b0", "#f44336", "#00bcd4", "#795548", "#607d8b",
];

/// One (x, y) sample. Serialises as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    /// Usually an epoch-ms timestamp.
    pub x: f64,
    /// Value at `x`.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f64, f64) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

/// Pick the color of series `index`, cycling through `colors`.
pub(crate) fn color_at(colors: &[String], index: usize) -> String {
    if colors.is_empty() {
        DEFAULT_COLORS[index % DEFAULT_COLORS.len()].to_string()
    } else {
        colors[index % colors.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serialises_as_pair() {
        let json = serde_json::to_string(&Point::new(1000.0, 2.5)).unwrap();
        assert_eq!(json, "[1000.0,2.5]");
        let parsed: Point = serde_json::from_str("[5,6]").unwrap();
        assert_eq!(parsed, Point::new(5.0, 6.0));
    }

    #[test]
    fn test_colors_cycle() {
        let colors = vec!["red".to_string(), "blue".to_string()];
        assert_eq!(color_at(&colors, 3), "blue");
        assert_eq!(color_at(&[], 8), DEFAULT_COLORS[0]);
    }
}
