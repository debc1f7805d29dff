use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::{extract_trending, TrendingPhrase};
use crate::ingest::normalize_snapshot;
use crate::ingest::types::NewsItem;
use crate::interactions::InteractionStore;
use crate::session::{RenderedFeed, RevealSignal, SharedSession};

pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub store: Arc<Mutex<InteractionStore>>,
    /// Where the interaction log is written after each write; `None` keeps it in memory.
    pub persist_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(session: SharedSession, store: InteractionStore) -> Self {
        Self {
            session,
            store: Arc::new(Mutex::new(store)),
            persist_path: None,
        }
    }

    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    fn persist(&self, store: &InteractionStore) {
        if let Some(p) = &self.persist_path {
            if let Err(e) = store.save_to_file(p) {
                tracing::warn!(target: "api", error = ?e, "saving interaction log failed");
            }
        }
    }
}

pub fn debug_routes_enabled() -> bool {
    std::env::var(ENV_DEBUG_ROUTES).ok().as_deref() == Some("1")
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/snapshot", post(apply_snapshot))
        .route("/feed", get(feed))
        .route("/reveal", post(reveal))
        .route("/filter", post(switch_filter))
        .route("/refresh", post(refresh))
        .route("/page", post(advance_page))
        .route("/trending", get(trending))
        .route("/interactions/click", post(track_click))
        .route("/interactions/dwell", post(track_dwell))
        .route("/interactions/scroll", post(track_rapid_scroll))
        .route("/interactions/like", post(like));

    if debug_routes_enabled() {
        router = router.merge(crate::debug::router());
    }

    router.layer(CorsLayer::very_permissive()).with_state(state)
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct SnapshotResp {
    pub kept: usize,
    pub dropped: usize,
    pub pending: usize,
}

async fn apply_snapshot(
    State(state): State<AppState>,
    Json(items): Json<Vec<NewsItem>>,
) -> Json<SnapshotResp> {
    let (kept, dropped) = normalize_snapshot(items);
    let n = kept.len();
    let pending = state
        .session
        .lock()
        .expect("session mutex poisoned")
        .apply_snapshot(kept, now());
    Json(SnapshotResp {
        kept: n,
        dropped,
        pending,
    })
}

async fn feed(State(state): State<AppState>) -> Json<RenderedFeed> {
    let mut session = state.session.lock().expect("session mutex poisoned");
    let mut store = state.store.lock().expect("store mutex poisoned");
    let log = store.snapshot();
    let rendered = session.render(&log, now(), &mut *store);
    state.persist(&store);
    Json(rendered)
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct RevealResp {
    pub revealed: bool,
    pub signal: Option<RevealSignal>,
}

async fn reveal(State(state): State<AppState>) -> Json<RevealResp> {
    let signal = state
        .session
        .lock()
        .expect("session mutex poisoned")
        .reveal(now());
    Json(RevealResp {
        revealed: signal.is_some(),
        signal,
    })
}

#[derive(serde::Deserialize)]
struct FilterReq {
    label: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct FilterResp {
    pub filter: String,
    pub epoch: u64,
    pub signal: Option<RevealSignal>,
}

async fn switch_filter(State(state): State<AppState>, Json(body): Json<FilterReq>) -> Json<FilterResp> {
    let mut s = state.session.lock().expect("session mutex poisoned");
    let signal = s.switch_filter(&body.label, now());
    Json(FilterResp {
        filter: s.filter().to_string(),
        epoch: s.epoch(),
        signal,
    })
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct EpochResp {
    pub epoch: u64,
}

async fn refresh(State(state): State<AppState>) -> Json<EpochResp> {
    let mut s = state.session.lock().expect("session mutex poisoned");
    s.refresh();
    Json(EpochResp { epoch: s.epoch() })
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct PageResp {
    pub advanced: bool,
    pub display_count: usize,
}

async fn advance_page(State(state): State<AppState>) -> Json<PageResp> {
    let mut s = state.session.lock().expect("session mutex poisoned");
    let advanced = s.advance_page(now());
    Json(PageResp {
        advanced,
        display_count: s.display_count(),
    })
}

/// Computed over the visible pool on demand, not the last render.
async fn trending(State(state): State<AppState>) -> Json<Vec<TrendingPhrase>> {
    let visible = state
        .session
        .lock()
        .expect("session mutex poisoned")
        .visible_items();
    Json(extract_trending(&visible))
}

#[derive(serde::Deserialize)]
struct ItemReq {
    item_id: String,
}

#[derive(serde::Deserialize)]
struct DwellReq {
    item_id: String,
    dwell_ms: u64,
}

#[derive(serde::Deserialize)]
struct LikeReq {
    item_id: String,
    #[serde(default = "default_true")]
    liked: bool,
}

fn default_true() -> bool {
    true
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct AckResp {
    pub ok: bool,
}

async fn track_click(
    State(state): State<AppState>,
    Json(body): Json<ItemReq>,
) -> Result<Json<AckResp>, StatusCode> {
    let session = state.session.lock().expect("session mutex poisoned");
    let mut store = state.store.lock().expect("store mutex poisoned");
    if !session.open_item(&body.item_id, now(), &mut *store) {
        return Err(StatusCode::NOT_FOUND);
    }
    state.persist(&store);
    Ok(Json(AckResp { ok: true }))
}

async fn track_dwell(
    State(state): State<AppState>,
    Json(body): Json<DwellReq>,
) -> Result<Json<AckResp>, StatusCode> {
    let session = state.session.lock().expect("session mutex poisoned");
    let mut store = state.store.lock().expect("store mutex poisoned");
    if !session.record_dwell(&body.item_id, body.dwell_ms, now(), &mut *store) {
        return Err(StatusCode::NOT_FOUND);
    }
    state.persist(&store);
    Ok(Json(AckResp { ok: true }))
}

async fn track_rapid_scroll(
    State(state): State<AppState>,
    Json(body): Json<ItemReq>,
) -> Result<Json<AckResp>, StatusCode> {
    let session = state.session.lock().expect("session mutex poisoned");
    let mut store = state.store.lock().expect("store mutex poisoned");
    if !session.record_rapid_scroll(&body.item_id, now(), &mut *store) {
        return Err(StatusCode::NOT_FOUND);
    }
    state.persist(&store);
    Ok(Json(AckResp { ok: true }))
}

async fn like(State(state): State<AppState>, Json(body): Json<LikeReq>) -> Result<Json<AckResp>, StatusCode> {
    let item = state
        .session
        .lock()
        .expect("session mutex poisoned")
        .find(&body.item_id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;

    let mut store = state.store.lock().expect("store mutex poisoned");
    let changed = if body.liked {
        store.like(&item, now())
    } else {
        store.unlike(&item.id)
    };
    if changed {
        state.persist(&store);
    }
    Ok(Json(AckResp { ok: changed }))
}
