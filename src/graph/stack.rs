//! Stacked series on a shared date axis.

use std::collections::BTreeMap;

use serde::Serialize;

use super::color_at;

/// One named, colored series of a stacked chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackDataSet {
    /// Series name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// One value per label of the owning graph.
    pub data: Vec<i64>,
}

/// Stacked chart: a label axis and aligned data sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackGraph {
    /// Shared axis, usually day starts in epoch ms.
    pub labels: Vec<i64>,
    /// Data sets in stacking order.
    pub data_sets: Vec<StackDataSet>,
}

/// Align named series to the dates of `per_date`.
///
/// `series_names` gives the stacking order and is kept as given. Dates where a
/// series has no value get 0. Colors cycle when there are fewer colors than
/// series.
pub fn to_stacked_series(
    per_date: &BTreeMap<i64, BTreeMap<String, i64>>,
    series_names: &[String],
    colors: &[String],
) -> StackGraph {
    let labels: Vec<i64> = per_date.keys().copied().collect();
    let data_sets = series_names
        .iter()
        .enumerate()
        .map(|(i, name)| StackDataSet {
            name: name.clone(),
            color: color_at(colors, i),
            data: per_date
                .values()
                .map(|values| values.get(name).copied().unwrap_or(0))
                .collect(),
        })
        .collect();
    StackGraph { labels, data_sets }
}
