//! Feed ranking service: binary entrypoint.
//! Boots the Axum HTTP server around one shared `FeedSession`, optionally
//! with a periodic snapshot pull and a persisted interaction log.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsfeed_ranker::api::{self, AppState};
use newsfeed_ranker::config::FeedConfig;
use newsfeed_ranker::debug::ENV_FEED_DEV_LOG;
use newsfeed_ranker::ingest::providers::JsonSnapshotSource;
use newsfeed_ranker::ingest::scheduler::{spawn_snapshot_scheduler, IngestSchedulerCfg};
use newsfeed_ranker::ingest::types::SnapshotSource;
use newsfeed_ranker::interactions::{InteractionStore, DEFAULT_STORE_CAPACITY};
use newsfeed_ranker::metrics::Metrics;
use newsfeed_ranker::session::FeedSession;

const ENV_SNAPSHOT_PATH: &str = "FEED_SNAPSHOT_PATH";
const ENV_INTERACTIONS_PATH: &str = "FEED_INTERACTIONS_PATH";

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEED_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var(ENV_FEED_DEV_LOG)
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("session=info,ingest=info,api=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let cfg = FeedConfig::load_default()?;
    let interval_secs = cfg.ingest.interval_secs;
    let page_size = cfg.session.page_size;
    let session = FeedSession::new(cfg).shared();

    let persist_path = std::env::var(ENV_INTERACTIONS_PATH).ok();
    let store = match &persist_path {
        Some(p) => InteractionStore::load_from_file(p, DEFAULT_STORE_CAPACITY),
        None => InteractionStore::default(),
    };

    // Periodic pull only when a snapshot file is configured; otherwise the
    // transport pushes through POST /snapshot.
    if let Ok(path) = std::env::var(ENV_SNAPSHOT_PATH) {
        let sources: Vec<Box<dyn SnapshotSource>> = vec![Box::new(JsonSnapshotSource::from_path(path))];
        spawn_snapshot_scheduler(IngestSchedulerCfg { interval_secs }, sources, session.clone());
    }

    let mut state = AppState::new(session, store);
    if let Some(p) = persist_path {
        state = state.with_persist_path(p);
    }

    let mut router = api::create_router(state);
    if api::debug_routes_enabled() {
        let metrics = Metrics::init(page_size)?;
        router = router.merge(metrics.router());
    }

    Ok(router.into())
}
