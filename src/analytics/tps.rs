//! Server performance statistics.

use super::average;
use crate::graph::Point;
use crate::model::TpsSample;

/// Read-only view over TPS samples of one server, ordered by date.
#[derive(Debug, Clone, Default)]
pub struct TpsMutator {
    samples: Vec<TpsSample>,
}

impl TpsMutator {
    /// Wrap samples, sorting them by date.
    pub fn new(mut samples: Vec<TpsSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self { samples }
    }

    /// Underlying samples.
    pub fn samples(&self) -> &[TpsSample] {
        &self.samples
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

    /// Mean TPS.
    pub fn average_tps(&self) -> Option<f64> {
        let values: Vec<f64> = self.samples.iter().map(|s| s.tps).collect();
        average(&values)
    }

    /// Number of times TPS dropped below `threshold`.
    ///
    /// Consecutive low samples are one spike.
    pub fn low_tps_spikes(&self, threshold: f64) -> usize {
        let mut spikes = 0;
        let mut was_low = false;
        for sample in &self.samples {
            let is_low = sample.tps < threshold;
            if is_low && !was_low {
                spikes += 1;
            }
            was_low = is_low;
        }
        spikes
    }

    /// Time not covered by samples.
    ///
    /// Every gap between consecutive samples longer than `gap_threshold_ms`
    /// counts in full.
    pub fn server_downtime(&self, gap_threshold_ms: i64) -> i64 {
        self.samples
            .windows(2)
            .map(|pair| pair[1].date - pair[0].date)
            .filter(|gap| *gap > gap_threshold_ms)
            .sum()
    }

    /// Mean players online.
    pub fn average_players(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .samples
            .iter()
            .map(|s| f64::from(s.players_online))
            .collect();
        average(&values)
    }

    /// Peak players online.
    pub fn max_players(&self) -> Option<u32> {
        self.samples.iter().map(|s| s.players_online).max()
    }

    /// Mean CPU usage over samples that reported it.
    pub fn average_cpu(&self) -> Option<f64> {
        let values: Vec<f64> = self
            .samples
            .iter()
            .map(|s| s.cpu_usage)
            .filter(|cpu| *cpu >= 0.0)
            .collect();
        average(&values)
    }

    /// Players online over time.
    pub fn players_series(&self) -> Vec<Point> {
        self.samples
            .iter()
            .map(|s| Point::new(s.date as f64, f64::from(s.players_online)))
            .collect()
    }

    /// TPS over time.
    pub fn tps_series(&self) -> Vec<Point> {
        self.samples
            .iter()
            .map(|s| Point::new(s.date as f64, s.tps))
            .collect()
    }
}
