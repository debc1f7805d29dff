//! Dev-only helpers: the anonymized dev-log gate and the `/debug/*` routes
//! (mounted when `DEBUG_ROUTES=1`).

use shuttle_axum::axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::analyze::scoring::{compose, ScoreBreakdown, ScoreContext};
use crate::analyze::{build_profiles, extract_trending};
use crate::api::AppState;

pub const ENV_FEED_DEV_LOG: &str = "FEED_DEV_LOG";

// Dev logging gate: FEED_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_FEED_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Short stable id for text that must not be logged raw.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

#[derive(Debug, Serialize)]
pub struct ScoreRow {
    /// anon_hash of the title
    pub id_hash: String,
    pub item_id: String,
    pub cached: Option<f32>,
    pub breakdown: Option<ScoreBreakdown>,
}

#[derive(Debug, Serialize)]
pub struct SessionStats {
    pub epoch: u64,
    pub pool: usize,
    pub pending: usize,
    pub shown: usize,
    pub cached_scores: usize,
    pub display_count: usize,
    pub filter: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/debug/scores", get(scores))
        .route("/debug/session", get(session_stats))
}

/// Uncached, jitter-free breakdown for every visible item next to the
/// score currently held by the cache.
async fn scores(State(state): State<AppState>) -> Json<Vec<ScoreRow>> {
    let log = state.store.lock().expect("store mutex poisoned").snapshot();
    let session = state.session.lock().expect("session mutex poisoned");
    let now = chrono::Utc::now();

    let visible = session.visible_items();
    let trending = extract_trending(&visible);
    let profiles = build_profiles(&log, now, &session.config().profiles);
    let counters = log.counters();
    let shown = session.shown_ids();
    let ctx = ScoreContext {
        now,
        trending: &trending,
        profiles: &profiles,
        counters: &counters,
        session_shown: &shown,
        weights: &session.config().scoring,
    };

    let rows = visible
        .iter()
        .map(|item| ScoreRow {
            id_hash: anon_hash(&item.title),
            item_id: item.id.clone(),
            cached: session.cached_score(&item.id),
            breakdown: compose(item, &ctx).ok(),
        })
        .collect();
    Json(rows)
}

async fn session_stats(State(state): State<AppState>) -> Json<SessionStats> {
    let s = state.session.lock().expect("session mutex poisoned");
    Json(SessionStats {
        epoch: s.epoch(),
        pool: s.pool_len(),
        pending: s.pending_count(),
        shown: s.shown_len(),
        cached_scores: s.cached_len(),
        display_count: s.display_count(),
        filter: s.filter().to_string(),
    })
}
