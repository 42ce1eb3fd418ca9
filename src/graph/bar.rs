//! Top-N bar charts.

use serde::Serialize;

/// One labelled bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    /// Category label.
    pub label: String,
    /// Bar height.
    pub value: u64,
}

/// Bars sorted by value descending, label ascending on ties, at most `limit`.
pub fn to_bars<I, L>(counts: I, limit: usize) -> Vec<Bar>
where
    I: IntoIterator<Item = (L, u64)>,
    L: Into<String>,
{
    let mut bars: Vec<Bar> = counts
        .into_iter()
        .map(|(label, value)| Bar {
            label: label.into(),
            value,
        })
        .collect();
    bars.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
    bars.truncate(limit);
    bars
}
