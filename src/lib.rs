// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod antiflutter;
pub mod api;
pub mod config;
pub mod debug;
pub mod ingest;
pub mod interactions;
pub mod metrics;
pub mod score_cache;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{build_profiles, extract_trending, rank, score_item, RankedItem};
pub use crate::api::{create_router, AppState};
pub use crate::config::FeedConfig;
pub use crate::ingest::types::NewsItem;
pub use crate::session::{FeedSession, RenderedFeed, RevealSignal, SharedSession};
