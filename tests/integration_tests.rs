//! Integration tests for playstat.
//!
//! These tests drive the tracker facade with a manual clock and verify that
//! closed sessions flow through storage into the analytics and graph layers.

use std::sync::Arc;

use playstat::analytics::{activity_groups, ActivityIndexCalculator, ActivityLabel, SessionsMutator};
use playstat::config::Config;
use playstat::graph::{simplify, to_pie, to_points};
use playstat::model::FinishedSession;
use playstat::storage::{MemoryStore, PersistenceWorker, SessionQuery, SessionSource, SqliteStore};
use playstat::tracker::ActivityTracker;
use playstat::util::time::{ManualClock, DAY, HOUR, MINUTE};
use uuid::Uuid;

const T0: i64 = 1_700_000_000_000;

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<MemoryStore>,
    tracker: ActivityTracker,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(T0));
    let store = Arc::new(MemoryStore::new());
    let tracker = ActivityTracker::new(3 * MINUTE, clock.clone(), store.clone());
    Harness {
        clock,
        store,
        tracker,
    }
}

fn all_sessions(store: &MemoryStore) -> Vec<FinishedSession> {
    store.fetch_sessions(&SessionQuery::all()).unwrap()
}

mod tracking {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_session_lifecycle() {
        let h = harness();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());

        h.tracker.player_joined(player, server, "world", "SURVIVAL");
        h.clock.advance(10 * MINUTE);
        assert!(h.tracker.world_changed(player, server, "nether", "SURVIVAL").unwrap());
        h.clock.advance(5 * MINUTE);
        assert!(h.tracker.game_mode_changed(player, server, "CREATIVE").unwrap());
        assert!(h.tracker.mob_killed(player, server));
        h.clock.advance(5 * MINUTE);
        assert!(h.tracker.player_left(player, server).unwrap());

        let sessions = all_sessions(&h.store);
        assert_eq!(sessions.len(), 1);
        let session = &sessions[0];
        assert_eq!(session.length(), 20 * MINUTE);
        assert_eq!(session.world_times().get("world", "SURVIVAL"), 10 * MINUTE);
        assert_eq!(session.world_times().get("nether", "SURVIVAL"), 5 * MINUTE);
        assert_eq!(session.world_times().get("nether", "CREATIVE"), 5 * MINUTE);
        assert_eq!(session.mob_kills(), 1);
        assert!(!h.tracker.sessions().is_online(player, server));
    }

    #[test]
    fn test_idle_time_credited_as_afk() {
        let h = harness();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());

        h.tracker.player_joined(player, server, "world", "SURVIVAL");
        h.clock.advance(10 * MINUTE);
        h.tracker.activity(player, server);
        h.clock.advance(MINUTE);
        h.tracker.player_left(player, server).unwrap();

        // Only idle time beyond the threshold counts.
        let session = &all_sessions(&h.store)[0];
        assert_eq!(session.afk_time(), 7 * MINUTE);
        assert_eq!(session.active_playtime(), 4 * MINUTE);
    }

    #[test]
    fn test_rejoin_closes_stale_session() {
        let h = harness();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());

        h.tracker.player_joined(player, server, "world", "SURVIVAL");
        h.clock.advance(HOUR);
        h.tracker.player_joined(player, server, "world", "SURVIVAL");

        let sessions = all_sessions(&h.store);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].end(), T0 + HOUR);
        assert_eq!(h.tracker.sessions().len(), 1);
    }

    #[test]
    fn test_pvp_recorded_on_both_sides() {
        let h = harness();
        let (killer, victim, server) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        h.tracker.player_joined(killer, server, "world", "SURVIVAL");
        h.tracker.player_joined(victim, server, "world", "SURVIVAL");
        h.clock.advance(MINUTE);
        assert!(h.tracker.player_killed(killer, victim, server, "DIAMOND_SWORD"));
        h.clock.advance(MINUTE);
        assert_eq!(h.tracker.shutdown(), 2);

        let sessions = SessionsMutator::new(all_sessions(&h.store));
        let kills = sessions.kill_counts();
        assert_eq!(kills.player_kills, 1);
        assert_eq!(kills.player_deaths, 1);
        assert_eq!(sessions.player_kills()[0].victim, victim);
    }

    #[test]
    fn test_events_for_offline_player_are_ignored() {
        let h = harness();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(!h.tracker.player_left(player, server).unwrap());
        assert!(!h.tracker.world_changed(player, server, "end", "SURVIVAL").unwrap());
        assert!(!h.tracker.died(player, server));
        assert!(h.store.is_empty());
    }
}

mod persistence {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sqlite_round_trip_through_tracker() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("sessions.db");
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let clock = Arc::new(ManualClock::new(T0));
        let tracker = ActivityTracker::new(3 * MINUTE, clock.clone(), store.clone());

        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());
        tracker.player_joined(player, server, "world", "SURVIVAL");
        clock.advance(30 * MINUTE);
        tracker.player_left(player, server).unwrap();
        drop(tracker);
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        let sessions = reopened.fetch_sessions(&SessionQuery::all().player(player)).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].length(), 30 * MINUTE);
        assert_eq!(reopened.player_ids().unwrap(), vec![player]);
    }

    #[tokio::test]
    async fn test_queue_drains_into_sqlite() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(T0));
        let (queue, worker) = PersistenceWorker::spawn(store.clone());
        let tracker = ActivityTracker::new(3 * MINUTE, clock.clone(), Arc::new(queue));

        for _ in 0..5 {
            tracker.player_joined(Uuid::new_v4(), Uuid::nil(), "world", "SURVIVAL");
        }
        clock.advance(HOUR);
        assert_eq!(tracker.shutdown(), 5);
        drop(tracker);

        let stats = worker.finish().await.unwrap();
        assert_eq!(stats.saved, 5);
        assert_eq!(store.session_count().unwrap(), 5);
    }
}

mod reporting {
    use super::*;
    use pretty_assertions::assert_eq;

    /// One session of `minutes` with activity every minute, then the rest of the day offline.
    fn played(h: &Harness, player: Uuid, minutes: i64) {
        h.tracker.player_joined(player, Uuid::nil(), "world", "SURVIVAL");
        for _ in 0..minutes {
            h.clock.advance(MINUTE);
            h.tracker.activity(player, Uuid::nil());
        }
        h.tracker.player_left(player, Uuid::nil()).unwrap();
        h.clock.advance(DAY - minutes * MINUTE);
    }

    #[test]
    fn test_activity_groups_from_tracked_sessions() {
        let h = harness();
        let regular = Uuid::new_v4();
        let casual = Uuid::new_v4();

        for day in 0..21 {
            played(&h, regular, 120);
            if day == 0 {
                h.tracker.player_joined(casual, Uuid::nil(), "world", "SURVIVAL");
                h.tracker.player_left(casual, Uuid::nil()).unwrap();
            }
        }

        let sessions = all_sessions(&h.store);
        assert!(sessions.iter().all(|s| s.afk_time() == 0));
        let now = h.clock.advance(0);
        let calculator = ActivityIndexCalculator::new(Config::default().activity);
        let indexes = [
            calculator.index_for(regular, now, &sessions),
            calculator.index_for(casual, now, &sessions),
        ];

        assert_eq!(indexes[0].label, ActivityLabel::VeryActive);
        assert_eq!(indexes[1].label, ActivityLabel::Inactive);

        let groups = activity_groups(indexes.iter());
        assert_eq!(groups[&ActivityLabel::VeryActive], 1);
        assert_eq!(groups[&ActivityLabel::Inactive], 1);
        assert_eq!(groups.values().sum::<usize>(), 2);
    }

    #[test]
    fn test_graphs_from_tracked_sessions() {
        let h = harness();
        let player = Uuid::new_v4();
        for _ in 0..5 {
            played(&h, player, 60);
        }

        let sessions = SessionsMutator::new(all_sessions(&h.store));
        let per_day = sessions.playtime_per_day(0);
        assert_eq!(per_day.values().sum::<i64>(), 5 * HOUR);

        // Constant playtime collapses to the endpoints.
        let points = to_points(per_day.into_iter().map(|(day, ms)| (day, ms as f64)));
        let simplified = simplify(&points, 0.5);
        assert_eq!(simplified.first(), points.first());
        assert_eq!(simplified.last(), points.last());
        assert!(simplified.len() <= points.len());

        let pie = to_pie(&sessions.world_time_distribution(), &[]);
        assert_eq!(pie.len(), 1);
        assert_eq!(pie[0].name, "world");
        assert_eq!(pie[0].percentage, 100.0);
    }
}
