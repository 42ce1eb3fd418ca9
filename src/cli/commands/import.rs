//! Import command implementation.
//!
//! Reads closed sessions as JSON lines and writes them through the background
//! persistence worker. Lines that fail to parse or violate session invariants
//! are skipped with a warning unless `--strict` is given.

use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{open_store, Cli, ImportArgs, OutputFormat};
use crate::config::Config;
use crate::error::{PlaystatError, Result};
use crate::model::FinishedSession;
use crate::storage::{PersistenceWorker, SessionSink};

use super::print_json;

/// Import outcome.
#[derive(Debug, Default, Serialize)]
struct ImportReport {
    /// Lines holding a valid session.
    read: usize,
    /// Lines skipped as malformed.
    skipped: usize,
    /// Sessions new to the database.
    inserted: usize,
    /// Sessions the database rejected.
    failed: usize,
}

/// Run the import command.
pub fn run(cli: &Cli, config: &Config, args: &ImportArgs) -> Result<()> {
    let reader = open_input(&args.input)?;
    // Parse everything first so a strict failure writes nothing
    let mut report = ImportReport::default();
    let mut sessions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| PlaystatError::io(format!("Failed to read line {line_no}"), e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<FinishedSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) if args.strict => {
                return Err(PlaystatError::SerializationError {
                    context: format!("line {line_no}"),
                    source: e,
                });
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping malformed session");
                report.skipped += 1;
            }
        }
    }
    report.read = sessions.len();

    let store = Arc::new(open_store(cli, config)?);
    let before = store.session_count()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| PlaystatError::io("Failed to start async runtime", e))?;

    let stats = runtime.block_on(async {
        let (queue, worker) = PersistenceWorker::spawn(Arc::clone(&store));
        for session in sessions {
            queue.save_session(session)?;
        }
        drop(queue);
        worker.finish().await
    })?;

    report.inserted = store.session_count()?.saturating_sub(before);
    report.failed = stats.failed;
    info!(read = report.read, inserted = report.inserted, "Import finished");

    match cli.effective_output() {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!(
                "Imported {} new session(s) from {} line(s)",
                report.inserted, report.read
            );
            if report.skipped > 0 {
                println!("Skipped {} malformed line(s)", report.skipped);
            }
            if report.failed > 0 {
                println!("Failed to store {} session(s)", report.failed);
            }
        }
    }
    Ok(())
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = std::fs::File::open(path)
        .map_err(|e| PlaystatError::io(format!("Failed to open {}", path.display()), e))?;
    Ok(Box::new(BufReader::new(file)))
}
