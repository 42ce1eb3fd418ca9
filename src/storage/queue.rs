//! Background persistence.
//!
//! Event handlers must not block on storage. A [`PersistenceQueue`] is a
//! [`SessionSink`] that only pushes the session onto a channel; the matching
//! [`PersistenceWorker`] drains the channel on a Tokio task and writes each
//! session into the real sink on the blocking pool. Failed saves are logged
//! and counted, never retried.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::SessionSink;
use crate::error::{PlaystatError, Result};
use crate::model::FinishedSession;

/// Sending half: hand closed sessions to the background worker.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<FinishedSession>,
}

impl SessionSink for PersistenceQueue {
    fn save_session(&self, session: FinishedSession) -> Result<()> {
        self.tx
            .send(session)
            .map_err(|_| PlaystatError::QueueClosed)
    }
}

/// Outcome counters of a finished worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Sessions written successfully.
    pub saved: usize,
    /// Sessions the sink rejected.
    pub failed: usize,
}

/// Background task writing queued sessions into a sink.
#[derive(Debug)]
pub struct PersistenceWorker {
    handle: JoinHandle<PersistenceStats>,
}

impl PersistenceWorker {
    /// Spawn a worker on the current Tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn<S>(sink: Arc<S>) -> (PersistenceQueue, Self)
    where
        S: SessionSink + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(sink, rx));
        info!("Persistence worker started");
        (PersistenceQueue { tx }, Self { handle })
    }

    /// Wait for the worker to drain the queue and stop.
    ///
    /// The worker stops once every [`PersistenceQueue`] clone is dropped.
    pub async fn finish(self) -> Result<PersistenceStats> {
        self.handle.await.map_err(|e| {
            PlaystatError::io("Persistence worker failed", std::io::Error::other(e))
        })
    }
}

async fn run<S>(sink: Arc<S>, mut rx: mpsc::UnboundedReceiver<FinishedSession>) -> PersistenceStats
where
    S: SessionSink + ?Sized + 'static,
{
    let mut stats = PersistenceStats::default();
    while let Some(session) = rx.recv().await {
        let player = session.player();
        let start = session.start();
        let sink = Arc::clone(&sink);
        match tokio::task::spawn_blocking(move || sink.save_session(session)).await {
            Ok(Ok(())) => {
                debug!(%player, start, "Session persisted");
                stats.saved += 1;
            }
            Ok(Err(e)) => {
                error!(%player, start, error = %e, "Failed to persist session");
                stats.failed += 1;
            }
            Err(e) => {
                error!(%player, start, error = %e, "Persistence task panicked");
                stats.failed += 1;
            }
        }
    }
    info!(saved = stats.saved, failed = stats.failed, "Persistence worker stopped");
    stats
}
