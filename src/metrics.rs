use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// Register descriptions for the engine series (so they show up on /metrics).
pub fn describe_engine_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_score_cache_hits_total", "Scores served from the epoch cache.");
        describe_counter!("feed_score_cache_misses_total", "Scores computed on cache miss.");
        describe_counter!(
            "feed_score_cache_evictions_total",
            "Entries dropped when the cache exceeded its bound."
        );
        describe_counter!("feed_score_failures_total", "Items that fell back to the floor score.");
        describe_counter!("feed_render_passes_total", "Render passes over the visible pool.");
        describe_counter!("feed_epoch_resets_total", "Explicit ranking epoch resets.");
        describe_gauge!("feed_pending_items", "New items waiting for a reveal.");
    });
}

impl Metrics {
    /// Install the Prometheus recorder. Fails if a recorder is already installed.
    pub fn init(page_size: usize) -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_engine_metrics();
        // Static gauge with the configured page size
        gauge!("feed_page_size").set(page_size as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
