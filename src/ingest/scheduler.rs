// src/ingest/scheduler.rs
use crate::ingest::types::SnapshotSource;
use crate::session::SharedSession;
use metrics::gauge;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

/// Pull once from all sources and apply the merged snapshot to `session`.
/// An empty merge (every source down) leaves the current pool alone.
/// Returns the pending count after the tick, or `None` when skipped.
pub async fn tick(sources: &[Box<dyn SnapshotSource>], session: &SharedSession) -> Option<usize> {
    let items = crate::ingest::run_once(sources).await;
    if items.is_empty() {
        tracing::warn!(target: "ingest", "empty snapshot, keeping current pool");
        return None;
    }

    let kept = items.len();
    let now = chrono::Utc::now();
    let pending = {
        let mut s = session.lock().expect("session mutex poisoned");
        s.apply_snapshot(items, now)
    };
    gauge!("feed_pending_items").set(pending as f64);

    tracing::info!(target: "ingest", kept, pending, "snapshot tick");
    Some(pending)
}

/// Spawn the periodic snapshot pull. The first tick fires immediately.
pub fn spawn_snapshot_scheduler(
    cfg: IngestSchedulerCfg,
    sources: Vec<Box<dyn SnapshotSource>>,
    session: SharedSession,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            tick(&sources, &session).await;
        }
    })
}
