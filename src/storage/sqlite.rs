//! SQLite session storage.
//!
//! Sessions live in a normalized schema: one row per session plus child rows
//! for world times, kills and deaths. The `(player, server, start)` unique
//! constraint together with `INSERT OR IGNORE` makes replays harmless.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::debug;
use uuid::Uuid;

use super::{SessionQuery, SessionSink, SessionSource};
use crate::error::{PlaystatError, Result};
use crate::model::{FinishedSession, PlayerDeath, PlayerKill, SessionRecord, WorldTimes};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        player TEXT NOT NULL,
        server TEXT NOT NULL,
        start INTEGER NOT NULL,
        end INTEGER NOT NULL,
        afk_time INTEGER NOT NULL DEFAULT 0,
        mob_kills INTEGER NOT NULL DEFAULT 0,
        environment_deaths INTEGER NOT NULL DEFAULT 0,
        UNIQUE (player, server, start)
    );

    CREATE TABLE IF NOT EXISTS world_times (
        session_id INTEGER NOT NULL,
        world TEXT NOT NULL,
        game_mode TEXT NOT NULL,
        time_ms INTEGER NOT NULL,
        FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS kills (
        session_id INTEGER NOT NULL,
        killer TEXT NOT NULL,
        victim TEXT NOT NULL,
        weapon TEXT NOT NULL,
        date INTEGER NOT NULL,
        FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS deaths (
        session_id INTEGER NOT NULL,
        killer TEXT NOT NULL,
        weapon TEXT NOT NULL,
        date INTEGER NOT NULL,
        FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_start ON sessions(start);
    CREATE INDEX IF NOT EXISTS idx_sessions_player ON sessions(player);
    CREATE INDEX IF NOT EXISTS idx_world_times_session ON world_times(session_id);
    CREATE INDEX IF NOT EXISTS idx_kills_session ON kills(session_id);
    CREATE INDEX IF NOT EXISTS idx_deaths_session ON deaths(session_id);
"#;

/// Session store backed by a SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlaystatError::io(format!("Failed to create directory: {}", parent.display()), e)
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            PlaystatError::storage(format!("Failed to open database: {}", path.display()), e)
        })?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PlaystatError::storage("Failed to open in-memory database", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| PlaystatError::storage("Failed to enable foreign keys", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| PlaystatError::storage("Failed to create schema", e))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Distinct players with at least one stored session.
    pub fn player_ids(&self) -> Result<Vec<Uuid>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT DISTINCT player FROM sessions ORDER BY player")?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.iter().map(|s| parse_uuid(s)).collect()
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SessionSink for SqliteStore {
    fn save_session(&self, session: FinishedSession) -> Result<()> {
        let record = session.into_record();
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| PlaystatError::storage("Failed to begin transaction", e))?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO sessions
                (player, server, start, end, afk_time, mob_kills, environment_deaths)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.player.to_string(),
                record.server.to_string(),
                record.start,
                record.end,
                record.afk_time,
                record.mob_kills,
                record.environment_deaths,
            ],
        )?;
        if inserted == 0 {
            debug!(player = %record.player, start = record.start, "Session already stored, skipping");
            return Ok(());
        }
        let session_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO world_times (session_id, world, game_mode, time_ms)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (world, gm_times) in record.world_times.iter() {
                for (game_mode, ms) in gm_times.iter() {
                    stmt.execute(params![session_id, world, game_mode, ms])?;
                }
            }

            let mut stmt = tx.prepare(
                "INSERT INTO kills (session_id, killer, victim, weapon, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for kill in &record.player_kills {
                stmt.execute(params![
                    session_id,
                    kill.killer.to_string(),
                    kill.victim.to_string(),
                    kill.weapon,
                    kill.date,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO deaths (session_id, killer, weapon, date) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for death in &record.player_deaths {
                stmt.execute(params![
                    session_id,
                    death.killer.to_string(),
                    death.weapon,
                    death.date,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| PlaystatError::storage("Failed to commit session", e))?;
        debug!(player = %record.player, session_id, "Session stored");
        Ok(())
    }
}

struct SessionRow {
    id: i64,
    player: String,
    server: String,
    start: i64,
    end: i64,
    afk_time: i64,
    mob_kills: u32,
    environment_deaths: u32,
}

impl SessionSource for SqliteStore {
    fn fetch_sessions(&self, query: &SessionQuery) -> Result<Vec<FinishedSession>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, player, server, start, end, afk_time, mob_kills, environment_deaths
             FROM sessions
             WHERE (?1 IS NULL OR player = ?1)
               AND (?2 IS NULL OR server = ?2)
               AND start >= ?3 AND start < ?4
             ORDER BY start, player, server",
        )?;
        let rows = stmt
            .query_map(
                params![
                    query.player.map(|p| p.to_string()),
                    query.server.map(|s| s.to_string()),
                    query.after,
                    query.before,
                ],
                |row| {
                    Ok(SessionRow {
                        id: row.get(0)?,
                        player: row.get(1)?,
                        server: row.get(2)?,
                        start: row.get(3)?,
                        end: row.get(4)?,
                        afk_time: row.get(5)?,
                        mob_kills: row.get(6)?,
                        environment_deaths: row.get(7)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut world_stmt =
            conn.prepare("SELECT world, game_mode, time_ms FROM world_times WHERE session_id = ?1")?;
        let mut kill_stmt = conn.prepare(
            "SELECT killer, victim, weapon, date FROM kills WHERE session_id = ?1 ORDER BY date",
        )?;
        let mut death_stmt = conn
            .prepare("SELECT killer, weapon, date FROM deaths WHERE session_id = ?1 ORDER BY date")?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let mut world_times = WorldTimes::new();
            let worlds = world_stmt
                .query_map([row.id], |r| {
                    Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, i64>(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (world, game_mode, ms) in worlds {
                world_times.add(&world, &game_mode, ms);
            }

            let kills = kill_stmt
                .query_map([row.id], |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, i64>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|(killer, victim, weapon, date)| {
                    Ok(PlayerKill {
                        killer: parse_uuid(&killer)?,
                        victim: parse_uuid(&victim)?,
                        weapon,
                        date,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let deaths = death_stmt
                .query_map([row.id], |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|(killer, weapon, date)| {
                    Ok(PlayerDeath {
                        killer: parse_uuid(&killer)?,
                        weapon,
                        date,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let record = SessionRecord {
                player: parse_uuid(&row.player)?,
                server: parse_uuid(&row.server)?,
                start: row.start,
                end: row.end,
                afk_time: row.afk_time,
                world_times,
                player_kills: kills,
                player_deaths: deaths,
                mob_kills: row.mob_kills,
                environment_deaths: row.environment_deaths,
            };
            sessions.push(FinishedSession::try_from(record)?);
        }
        Ok(sessions)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| PlaystatError::StorageError {
        message: format!("Malformed UUID '{raw}' in database: {e}"),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ActiveSession;
    use pretty_assertions::assert_eq;

    fn sample_session(player: Uuid, server: Uuid, start: i64) -> FinishedSession {
        let mut session = ActiveSession::start(player, server, start, "spawn", "SURVIVAL");
        session.change_world("nether", "CREATIVE", start + 400).unwrap();
        session.player_killed(Uuid::new_v4(), "Bow", start + 500);
        session.killed_by(Uuid::new_v4(), "Sword", start + 600);
        session.mob_killed();
        session.died();
        session.add_afk(100);
        session.end(start + 1000).unwrap()
    }

    #[test]
    fn test_save_and_fetch_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());
        let session = sample_session(player, server, 10_000);

        store.save_session(session.clone()).unwrap();
        let fetched = store.fetch_sessions(&SessionQuery::all()).unwrap();

        assert_eq!(fetched, vec![session]);
    }

    #[test]
    fn test_replay_is_ignored() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());
        let session = sample_session(player, server, 0);

        store.save_session(session.clone()).unwrap();
        store.save_session(session).unwrap();

        assert_eq!(store.session_count().unwrap(), 1);
        let fetched = store.fetch_sessions(&SessionQuery::all()).unwrap();
        assert_eq!(fetched[0].world_times().total(), 1000);
        assert_eq!(fetched[0].player_kills().len(), 1);
    }

    #[test]
    fn test_query_filters() {
        let store = SqliteStore::open_in_memory().unwrap();
        let (a, b, server) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.save_session(sample_session(a, server, 0)).unwrap();
        store.save_session(sample_session(a, server, 5000)).unwrap();
        store.save_session(sample_session(b, server, 2000)).unwrap();

        let only_a = store.fetch_sessions(&SessionQuery::all().player(a)).unwrap();
        assert_eq!(only_a.len(), 2);

        let window = store
            .fetch_sessions(&SessionQuery::all().between(2000, 5000))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].player(), b);

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.player_ids().unwrap(), expected);
    }

    #[test]
    fn test_open_file_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data").join("stats.db");
        let (player, server) = (Uuid::new_v4(), Uuid::new_v4());

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_session(sample_session(player, server, 0)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.session_count().unwrap(), 1);
    }
}
