//! Activity index.
//!
//! The lookback window before a reference date is split into `periods`
//! sub-periods of `period_days` days, most recent first. Each sub-period gets
//! a score in `[0, 1)`:
//!
//! ```text
//! playtime_score = 1 - 1 / (pi/2 * active_playtime / playtime_threshold + 1)
//! login_score    = min(logins / min_logins, 1)        (1 if min_logins == 0)
//! score          = playtime_score * login_score
//! ```
//!
//! The index is `5 * sum(weight_i * score_i) / sum(weight_i)`, so it ranges
//! over `[0, 5)`. Both factors are non-decreasing in their inputs and all
//! weights are positive, so more playtime or more logins in any sub-period
//! never lowers the index.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::FRAC_PI_2;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;
use uuid::Uuid;

use crate::config::ActivityConfig;
use crate::model::FinishedSession;
use crate::util::time::DAY;

/// Upper bound of the index scale.
pub const MAX_INDEX: f64 = 5.0;

/// Classification derived from the numeric index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ActivityLabel {
    /// Index of at least 3.75.
    #[serde(rename = "Very Active")]
    VeryActive,
    /// Index of at least 3.0.
    Active,
    /// Index of at least 2.0.
    Regular,
    /// Index of at least 1.0.
    Irregular,
    /// Anything lower.
    Inactive,
}

impl ActivityLabel {
    /// All labels, most active first.
    pub const ALL: [Self; 5] = [
        Self::VeryActive,
        Self::Active,
        Self::Regular,
        Self::Irregular,
        Self::Inactive,
    ];

    /// Label for a numeric index.
    pub fn from_index(value: f64) -> Self {
        if value >= 3.75 {
            Self::VeryActive
        } else if value >= 3.0 {
            Self::Active
        } else if value >= 2.0 {
            Self::Regular
        } else if value >= 1.0 {
            Self::Irregular
        } else {
            Self::Inactive
        }
    }

    /// Display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryActive => "Very Active",
            Self::Active => "Active",
            Self::Regular => "Regular",
            Self::Irregular => "Irregular",
            Self::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity index of one player at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityIndex {
    /// Numeric index in `[0, 5)`.
    pub value: f64,
    /// Label derived from `value`.
    pub label: ActivityLabel,
    /// Reference date the lookback window ends at.
    pub date: i64,
}

impl ActivityIndex {
    /// Compute the index from sessions ending the window at `date`.
    ///
    /// Sessions count for the sub-period their start falls into. Callers pass
    /// one player's sessions.
    pub fn calculate(sessions: &[FinishedSession], date: i64, config: &ActivityConfig) -> Self {
        let period = i64::from(config.period_days.max(1)) * DAY;
        let periods = config.periods.max(1);

        let mut playtime = vec![0i64; periods];
        let mut logins = vec![0u32; periods];
        for session in sessions {
            let age = date - session.start();
            if age <= 0 {
                continue;
            }
            let slot = ((age - 1) / period) as usize;
            if slot < periods {
                playtime[slot] += session.active_playtime();
                logins[slot] += 1;
            }
        }

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for slot in 0..periods {
            let weight = config.weights.get(slot).copied().unwrap_or(1.0);
            let score = period_score(playtime[slot], logins[slot], config);
            weighted += weight * score;
            weight_sum += weight;
        }

        let value = if weight_sum > 0.0 {
            MAX_INDEX * weighted / weight_sum
        } else {
            0.0
        };
        Self {
            value,
            label: ActivityLabel::from_index(value),
            date,
        }
    }
}

fn period_score(playtime: i64, logins: u32, config: &ActivityConfig) -> f64 {
    let ratio = playtime.max(0) as f64 / config.playtime_threshold_ms.max(1) as f64;
    let playtime_score = 1.0 - 1.0 / (FRAC_PI_2 * ratio + 1.0);
    let login_score = if config.min_logins == 0 {
        1.0
    } else {
        (f64::from(logins) / f64::from(config.min_logins)).min(1.0)
    };
    playtime_score * login_score
}

/// Memoising activity index calculator.
///
/// Results are cached per (player, date) for the lifetime of the calculator.
#[derive(Debug)]
pub struct ActivityIndexCalculator {
    config: ActivityConfig,
    memo: Mutex<HashMap<(Uuid, i64), ActivityIndex>>,
}

impl ActivityIndexCalculator {
    /// Create a calculator.
    pub fn new(config: ActivityConfig) -> Self {
        Self {
            config,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    /// Index of `player` at `date`, computed from the player's entries in
    /// `sessions` on first request.
    pub fn index_for(&self, player: Uuid, date: i64, sessions: &[FinishedSession]) -> ActivityIndex {
        if let Some(cached) = self.memo.lock().get(&(player, date)) {
            return *cached;
        }

        let own: Vec<FinishedSession> = sessions
            .iter()
            .filter(|s| s.player() == player)
            .cloned()
            .collect();
        let index = ActivityIndex::calculate(&own, date, &self.config);
        trace!(%player, date, value = index.value, "Activity index computed");

        *self.memo.lock().entry((player, date)).or_insert(index)
    }

    /// Number of memoised results.
    pub fn cached(&self) -> usize {
        self.memo.lock().len()
    }

    /// Forget memoised results.
    pub fn clear(&self) {
        self.memo.lock().clear();
    }
}

/// Players per label. Every label is present, most active first.
pub fn activity_groups<'a>(
    indexes: impl IntoIterator<Item = &'a ActivityIndex>,
) -> BTreeMap<ActivityLabel, usize> {
    let mut groups: BTreeMap<ActivityLabel, usize> =
        ActivityLabel::ALL.iter().map(|label| (*label, 0)).collect();
    for index in indexes {
        *groups.entry(index.label).or_insert(0) += 1;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActiveSession;
    use crate::util::time::{HOUR, WEEK};
    use rstest::rstest;

    const DATE: i64 = 100 * WEEK;

    fn session(player: Uuid, start: i64, length: i64) -> FinishedSession {
        ActiveSession::start(player, Uuid::nil(), start, "world", "SURVIVAL")
            .end(start + length)
            .unwrap()
    }

    #[rstest]
    #[case(4.0, ActivityLabel::VeryActive)]
    #[case(3.75, ActivityLabel::VeryActive)]
    #[case(3.0, ActivityLabel::Active)]
    #[case(2.5, ActivityLabel::Regular)]
    #[case(1.0, ActivityLabel::Irregular)]
    #[case(0.99, ActivityLabel::Inactive)]
    fn test_label_cuts(#[case] value: f64, #[case] expected: ActivityLabel) {
        assert_eq!(ActivityLabel::from_index(value), expected);
    }

    #[test]
    fn test_no_sessions_is_inactive_zero() {
        let index = ActivityIndex::calculate(&[], DATE, &ActivityConfig::default());
        assert_eq!(index.value, 0.0);
        assert_eq!(index.label, ActivityLabel::Inactive);
    }

    #[test]
    fn test_regular_weekly_player_scores_higher_than_occasional() {
        let config = ActivityConfig::default();
        let player = Uuid::new_v4();
        let regular: Vec<_> = (0..3)
            .map(|week| session(player, DATE - week * WEEK - 2 * HOUR, HOUR))
            .collect();
        let occasional = vec![session(player, DATE - 2 * WEEK - 2 * HOUR, HOUR)];

        let a = ActivityIndex::calculate(&regular, DATE, &config);
        let b = ActivityIndex::calculate(&occasional, DATE, &config);
        assert!(a.value > b.value);
        assert!(a.value < MAX_INDEX);
    }

    #[test]
    fn test_recent_period_weighs_more() {
        let config = ActivityConfig::default();
        let player = Uuid::new_v4();
        let recent = vec![session(player, DATE - HOUR * 2, HOUR)];
        let old = vec![session(player, DATE - 2 * WEEK - HOUR * 2, HOUR)];

        let a = ActivityIndex::calculate(&recent, DATE, &config);
        let b = ActivityIndex::calculate(&old, DATE, &config);
        assert!(a.value > b.value);
    }

    #[test]
    fn test_sessions_outside_window_ignored() {
        let config = ActivityConfig::default();
        let player = Uuid::new_v4();
        let sessions = vec![
            session(player, DATE, HOUR),
            session(player, DATE - 3 * WEEK - HOUR, HOUR),
        ];
        assert_eq!(ActivityIndex::calculate(&sessions, DATE, &config).value, 0.0);
    }

    #[test]
    fn test_calculator_memoises_per_player_and_date() {
        let calc = ActivityIndexCalculator::new(ActivityConfig::default());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let sessions = vec![session(a, DATE - 2 * HOUR, HOUR), session(b, DATE - 2 * HOUR, 10 * HOUR)];

        let first = calc.index_for(a, DATE, &sessions);
        // Different input, same key: memo wins
        let second = calc.index_for(a, DATE, &[]);
        assert_eq!(first, second);
        assert_eq!(calc.cached(), 1);

        let other = calc.index_for(b, DATE, &sessions);
        assert!(other.value > first.value);
        assert_eq!(calc.cached(), 2);
    }

    #[test]
    fn test_activity_groups_include_every_label() {
        let indexes = [
            ActivityIndex {
                value: 4.0,
                label: ActivityLabel::VeryActive,
                date: 0,
            },
            ActivityIndex {
                value: 0.0,
                label: ActivityLabel::Inactive,
                date: 0,
            },
            ActivityIndex {
                value: 0.5,
                label: ActivityLabel::Inactive,
                date: 0,
            },
        ];
        let groups = activity_groups(&indexes);
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[&ActivityLabel::Inactive], 2);
        assert_eq!(groups[&ActivityLabel::Regular], 0);
        assert_eq!(groups.keys().next(), Some(&ActivityLabel::VeryActive));
    }
}
