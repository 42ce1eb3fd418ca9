//! Ping statistics.

use uuid::Uuid;

use super::{average, median};
use crate::model::PingSample;

/// Read-only view over ping samples.
#[derive(Debug, Clone, Default)]
pub struct PingMutator {
    samples: Vec<PingSample>,
}

impl PingMutator {
    /// Wrap samples, sorting them by date.
    pub fn new(mut samples: Vec<PingSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self { samples }
    }

    /// Underlying samples.
    pub fn samples(&self) -> &[PingSample] {
        &self.samples
    }

    /// Samples from one server.
    #[must_use]
    pub fn filter_server(&self, server: Uuid) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .filter(|s| s.server == server)
                .cloned()
                .collect(),
        }
    }

    /// Samples dated within `[after, before)`.
    #[must_use]
    pub fn filter_between(&self, after: i64, before: i64) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .filter(|s| s.date >= after && s.date < before)
                .cloned()
                .collect(),
        }
    }

    /// Median of the per-window averages.
    pub fn median_ping(&self) -> Option<f64> {
        median(&self.averages())
    }

    /// Mean of the per-window averages.
    pub fn average_ping(&self) -> Option<f64> {
        average(&self.averages())
    }

    /// Lowest ping seen.
    pub fn min_ping(&self) -> Option<i32> {
        self.samples.iter().map(|s| s.min).min()
    }

    /// Highest ping seen.
    pub fn max_ping(&self) -> Option<i32> {
        self.samples.iter().map(|s| s.max).max()
    }

    fn averages(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.average).collect()
    }
}
