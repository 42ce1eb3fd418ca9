//! AFK detection.
//!
//! [`AfkTracker`] remembers when each online player last did something and
//! turns idle gaps into AFK credit. A player only counts as AFK once idle for
//! longer than the threshold, and the threshold window itself is never
//! charged: two actions `threshold + 500` ms apart credit exactly 500 ms.
//!
//! The tracker does not touch sessions. Every operation returns the credit it
//! produced and the caller decides which session receives it.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::util::time::MINUTE;

/// Default idle time before a player counts as AFK.
pub const DEFAULT_AFK_THRESHOLD_MS: i64 = 3 * MINUTE;

/// AFK milliseconds produced by one tracker operation.
pub type AfkCredit = i64;

/// What the tracker knows about a player's last action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastAction {
    /// Last action at this epoch-ms timestamp.
    At(i64),
    /// The player is immune to AFK detection.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct PlayerState {
    last_action: LastAction,
    used_afk_command: bool,
}

/// Per-player last-action bookkeeping.
#[derive(Debug)]
pub struct AfkTracker {
    threshold_ms: i64,
    players: Mutex<HashMap<Uuid, PlayerState>>,
}

impl Default for AfkTracker {
    fn default() -> Self {
        Self::new(DEFAULT_AFK_THRESHOLD_MS)
    }
}

impl AfkTracker {
    /// Create a tracker. Negative thresholds are treated as zero.
    pub fn new(threshold_ms: i64) -> Self {
        Self {
            threshold_ms: threshold_ms.max(0),
            players: Mutex::new(HashMap::new()),
        }
    }

    /// Configured threshold in milliseconds.
    pub fn threshold(&self) -> i64 {
        self.threshold_ms
    }

    /// Start tracking a player from `timestamp`, forgetting earlier state.
    ///
    /// Ignored players stay ignored.
    pub fn reset(&self, player: Uuid, timestamp: i64) {
        let mut players = self.players.lock();
        let state = players.entry(player).or_insert(PlayerState {
            last_action: LastAction::At(timestamp),
            used_afk_command: false,
        });
        if state.last_action != LastAction::Ignored {
            state.last_action = LastAction::At(timestamp);
        }
        state.used_afk_command = false;
    }

    /// Record an action and return the AFK time that ended with it.
    ///
    /// The first action of an unknown player only starts tracking. Actions at
    /// or before the previous one are no-ops.
    pub fn record_activity(&self, player: Uuid, timestamp: i64) -> AfkCredit {
        let mut players = self.players.lock();
        let Some(state) = players.get_mut(&player) else {
            players.insert(
                player,
                PlayerState {
                    last_action: LastAction::At(timestamp),
                    used_afk_command: false,
                },
            );
            return 0;
        };

        let LastAction::At(last) = state.last_action else {
            return 0;
        };
        if timestamp <= last {
            return 0;
        }

        state.last_action = LastAction::At(timestamp);
        state.used_afk_command = false;
        let credit = self.credit_for(timestamp - last);
        if credit > 0 {
            debug!(%player, credit, "AFK period ended");
        }
        credit
    }

    /// Make a player immune to AFK detection until they log out.
    pub fn mark_ignored(&self, player: Uuid) {
        self.players.lock().insert(
            player,
            PlayerState {
                last_action: LastAction::Ignored,
                used_afk_command: false,
            },
        );
    }

    /// The player declared themselves AFK at `timestamp`.
    ///
    /// The last action is backdated by the threshold so that the next action
    /// credits the whole time since the command.
    pub fn used_afk_command(&self, player: Uuid, timestamp: i64) {
        let mut players = self.players.lock();
        let state = players.entry(player).or_insert(PlayerState {
            last_action: LastAction::At(timestamp),
            used_afk_command: false,
        });
        if state.last_action == LastAction::Ignored {
            return;
        }
        state.last_action = LastAction::At(timestamp - self.threshold_ms);
        state.used_afk_command = true;
    }

    /// Flush pending AFK time and forget the player.
    pub fn logged_out(&self, player: Uuid, timestamp: i64) -> AfkCredit {
        let Some(state) = self.players.lock().remove(&player) else {
            return 0;
        };
        match state.last_action {
            LastAction::At(last) if timestamp > last => self.credit_for(timestamp - last),
            _ => 0,
        }
    }

    /// AFK time pending as of `timestamp`, without changing any state.
    pub fn pending(&self, player: Uuid, timestamp: i64) -> AfkCredit {
        match self.players.lock().get(&player).map(|s| s.last_action) {
            Some(LastAction::At(last)) if timestamp > last => self.credit_for(timestamp - last),
            _ => 0,
        }
    }

    /// Stop tracking a player without producing credit.
    pub fn forget(&self, player: Uuid) {
        self.players.lock().remove(&player);
    }

    /// Whether the player is AFK as of `now`.
    pub fn is_afk(&self, player: Uuid, now: i64) -> bool {
        match self.players.lock().get(&player) {
            Some(PlayerState {
                used_afk_command: true,
                ..
            }) => true,
            Some(PlayerState {
                last_action: LastAction::At(last),
                ..
            }) => now - last > self.threshold_ms,
            _ => false,
        }
    }

    /// Current state of a player, if tracked.
    pub fn last_action(&self, player: Uuid) -> Option<LastAction> {
        self.players.lock().get(&player).map(|s| s.last_action)
    }

    /// Number of tracked players.
    pub fn tracked_players(&self) -> usize {
        self.players.lock().len()
    }

    fn credit_for(&self, idle: i64) -> AfkCredit {
        if idle > self.threshold_ms {
            idle - self.threshold_ms
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const T: i64 = 1000;

    #[test]
    fn test_pending_does_not_consume_credit() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.reset(player, 0);

        assert_eq!(tracker.pending(player, 3 * T), 2 * T);
        assert_eq!(tracker.pending(player, 3 * T), 2 * T);
        assert_eq!(tracker.record_activity(player, 3 * T), 2 * T);

        tracker.forget(player);
        assert_eq!(tracker.pending(player, 10 * T), 0);
        assert_eq!(tracker.tracked_players(), 0);
    }

    #[test]
    fn test_threshold_grace_is_not_charged() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();

        assert_eq!(tracker.record_activity(player, 0), 0);
        assert_eq!(tracker.record_activity(player, T + 500), 500);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(T, 0)]
    #[case(T + 1, 1)]
    #[case(10 * T, 9 * T)]
    fn test_credit_for_gap(#[case] gap: i64, #[case] expected: i64) {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 10_000);
        assert_eq!(tracker.record_activity(player, 10_000 + gap), expected);
    }

    #[test]
    fn test_out_of_order_activity_is_noop() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 5000);

        assert_eq!(tracker.record_activity(player, 4000), 0);
        assert_eq!(tracker.last_action(player), Some(LastAction::At(5000)));
    }

    #[test]
    fn test_ignored_player_never_accrues() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 0);
        tracker.mark_ignored(player);
        tracker.used_afk_command(player, 10);

        assert_eq!(tracker.record_activity(player, 100 * T), 0);
        assert_eq!(tracker.logged_out(player, 200 * T), 0);
        assert!(!tracker.is_afk(player, 200 * T));
    }

    #[test]
    fn test_afk_command_credits_full_gap() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 0);
        tracker.used_afk_command(player, 2000);
        assert!(tracker.is_afk(player, 2001));

        // Back 700 ms after declaring AFK: all 700 ms count
        assert_eq!(tracker.record_activity(player, 2700), 700);
        assert!(!tracker.is_afk(player, 2701));
    }

    #[test]
    fn test_logout_flushes_and_forgets() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 0);

        assert_eq!(tracker.logged_out(player, 3 * T), 2 * T);
        assert_eq!(tracker.tracked_players(), 0);
        assert_eq!(tracker.logged_out(player, 4 * T), 0);
    }

    #[test]
    fn test_reset_keeps_ignored() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.mark_ignored(player);
        tracker.reset(player, 50);
        assert_eq!(tracker.last_action(player), Some(LastAction::Ignored));

        let other = Uuid::new_v4();
        tracker.record_activity(other, 0);
        tracker.reset(other, 50 * T);
        assert_eq!(tracker.record_activity(other, 50 * T + 10), 0);
    }

    #[test]
    fn test_is_afk_after_threshold() {
        let tracker = AfkTracker::new(T);
        let player = Uuid::new_v4();
        tracker.record_activity(player, 0);
        assert!(!tracker.is_afk(player, T));
        assert!(tracker.is_afk(player, T + 1));
        assert!(!tracker.is_afk(Uuid::new_v4(), T + 1));
    }
}
