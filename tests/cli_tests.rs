//! End-to-end tests for the playstat binary.
//!
//! Each test points the config and data directories at a temporary
//! directory so the user's own files are never touched.
//!
//! Run with: `cargo test --test cli_tests`

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PLAYER_A: &str = "4f1c2a9e-6d3b-4b8e-9a11-0c7e5d2f8a01";
const PLAYER_B: &str = "9b0e7c44-2f6a-4d1d-8e3c-5a9f1b6d2c02";
const SERVER: &str = "00000000-0000-0000-0000-0000000000aa";

const DAY: i64 = 86_400_000;
const HOUR: i64 = 3_600_000;
const DATE: i64 = 1_700_000_000_000;

/// Command with isolated config/data directories and no inherited settings.
fn playstat(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_playstat"));
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("HOME", home.path())
        .env_remove("PLAYSTAT_DB")
        .env_remove("PLAYSTAT_CONFIG")
        .env_remove("PLAYSTAT_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn session_line(player: &str, start: i64, length: i64) -> String {
    format!(
        r#"{{"player":"{player}","server":"{SERVER}","start":{start},"end":{},"world_times":{{"world":{{"SURVIVAL":{length}}}}}}}"#,
        start + length
    )
}

fn write_sessions(path: &Path, lines: &[String]) {
    std::fs::write(path, lines.join("\n")).unwrap();
}

/// Import a small fixture and return the database path.
fn seeded_db(home: &TempDir) -> String {
    let input = home.path().join("sessions.jsonl");
    write_sessions(
        &input,
        &[
            session_line(PLAYER_A, DATE - 2 * DAY, 2 * HOUR),
            session_line(PLAYER_A, DATE - DAY, 3 * HOUR),
            session_line(PLAYER_B, DATE - 20 * DAY, HOUR),
        ],
    );
    let db = home.path().join("stats.db").display().to_string();
    playstat(home)
        .args(["--db", &db, "import"])
        .arg(&input)
        .assert()
        .success();
    db
}

mod config_cmd {
    use super::*;

    #[test]
    fn test_config_path_uses_config_dir() {
        let home = TempDir::new().unwrap();
        playstat(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("playstat").and(predicate::str::contains("config.toml")));
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("custom.toml");
        let path_arg = path.to_str().unwrap();

        playstat(&home)
            .args(["--config", path_arg, "config", "init"])
            .assert()
            .success();
        assert!(path.exists());

        playstat(&home)
            .args(["--config", path_arg, "config", "init"])
            .assert()
            .code(64)
            .stderr(predicate::str::contains("--force"));

        playstat(&home)
            .args(["--config", path_arg, "config", "init", "--force"])
            .assert()
            .success();
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("absent.toml");

        playstat(&home)
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .code(5)
            .stderr(predicate::str::contains("Configuration error"));
    }

    #[test]
    fn test_config_show_json() {
        let home = TempDir::new().unwrap();
        playstat(&home)
            .args(["--json", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"threshold_ms\": 180000"));
    }
}

mod import_cmd {
    use super::*;

    #[test]
    fn test_import_skips_bad_lines_and_dedupes() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("sessions.jsonl");
        write_sessions(
            &input,
            &[
                session_line(PLAYER_A, DATE, HOUR),
                "not json".to_string(),
                session_line(PLAYER_B, DATE, 2 * HOUR),
            ],
        );
        let db = home.path().join("stats.db").display().to_string();

        playstat(&home)
            .args(["--db", &db, "import"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 2 new session(s)"))
            .stdout(predicate::str::contains("Skipped 1 malformed line(s)"));

        playstat(&home)
            .args(["--db", &db, "import"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 0 new session(s)"));
    }

    #[test]
    fn test_import_strict_fails_on_bad_line() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("sessions.jsonl");
        write_sessions(&input, &[session_line(PLAYER_A, DATE, HOUR), "{}".to_string()]);
        let db = home.path().join("stats.db").display().to_string();

        playstat(&home)
            .args(["--db", &db, "import", "--strict"])
            .arg(&input)
            .assert()
            .code(65);

        // The valid line before the bad one was not written either
        playstat(&home)
            .args(["--db", &db, "stats"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No sessions found."));
    }

    #[test]
    fn test_import_skips_overflowing_timestamps() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("sessions.jsonl");
        write_sessions(
            &input,
            &[
                format!(
                    r#"{{"player":"{PLAYER_A}","server":"{SERVER}","start":{},"end":{}}}"#,
                    i64::MIN,
                    i64::MAX
                ),
                session_line(PLAYER_B, DATE, HOUR),
            ],
        );
        let db = home.path().join("stats.db").display().to_string();

        playstat(&home)
            .args(["--db", &db, "import"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 1 new session(s)"))
            .stdout(predicate::str::contains("Skipped 1 malformed line(s)"));
    }

    #[test]
    fn test_import_rejects_end_before_start() {
        let home = TempDir::new().unwrap();
        let input = home.path().join("sessions.jsonl");
        write_sessions(
            &input,
            &[format!(
                r#"{{"player":"{PLAYER_A}","server":"{SERVER}","start":{DATE},"end":{}}}"#,
                DATE - 1
            )],
        );
        let db = home.path().join("stats.db").display().to_string();

        playstat(&home)
            .args(["--db", &db, "import"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 0 new session(s)"));
    }
}

mod report_cmds {
    use super::*;

    #[test]
    fn test_stats_json() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "--json", "stats", "--top"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"sessions\": 3"))
            .stdout(predicate::str::contains("\"unique_players\": 2"))
            .stdout(predicate::str::contains(PLAYER_A));
    }

    #[test]
    fn test_stats_filters_by_player() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "--json", "stats", "--player", PLAYER_B])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"sessions\": 1"));
    }

    #[test]
    fn test_stats_text_empty_db() {
        let home = TempDir::new().unwrap();
        let db = home.path().join("empty.db").display().to_string();

        playstat(&home)
            .args(["--db", &db, "stats"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No sessions found."));
    }

    #[test]
    fn test_activity_groups() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "--json", "activity", "--groups", "--date", &DATE.to_string()])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"Very Active\": 0"))
            .stdout(predicate::str::contains("\"Regular\": 1"))
            .stdout(predicate::str::contains("\"Inactive\": 1"));
    }

    #[test]
    fn test_activity_single_player() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "ai", "--player", PLAYER_A, "--date", &DATE.to_string()])
            .assert()
            .success()
            .stdout(predicate::str::contains(PLAYER_A))
            .stdout(predicate::str::contains(PLAYER_B).not());
    }

    #[test]
    fn test_graph_pie() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "graph", "pie"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"name\": \"world\""))
            .stdout(predicate::str::contains("\"percentage\": 100.0"));
    }

    #[test]
    fn test_graph_playtime_points() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "graph", "playtime"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"points\""));
    }

    #[test]
    fn test_graph_rejects_negative_epsilon() {
        let home = TempDir::new().unwrap();
        let db = seeded_db(&home);

        playstat(&home)
            .args(["--db", &db, "graph", "sessions", "--epsilon=-1"])
            .assert()
            .code(64);
    }
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    playstat(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("playstat"));
}

#[test]
fn test_unknown_command_fails() {
    let home = TempDir::new().unwrap();
    playstat(&home).arg("frobnicate").assert().failure();
}
