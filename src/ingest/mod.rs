// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::{NewsItem, SnapshotSource};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_snapshots_total", "Snapshots pulled from sources.");
        describe_counter!(
            "ingest_items_dropped_total",
            "Items dropped for empty id/title or duplicate id."
        );
        describe_counter!("ingest_source_errors_total", "Source fetch errors.");
        describe_counter!("ingest_items_total", "Raw items fetched, per source.");
        describe_histogram!("ingest_fetch_ms", "Snapshot fetch latency in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Normalize text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Normalize titles/summaries and drop unusable or duplicate items.
/// The first occurrence of an id wins. Returns `(kept, dropped)`.
pub fn normalize_snapshot(raw: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for mut item in raw {
        item.id = item.id.trim().to_string();
        item.title = normalize_text(&item.title);
        item.summary = normalize_text(&item.summary);
        item.source = item.source.trim().to_string();
        item.category = item.category.trim().to_string();

        if item.id.is_empty() || item.title.is_empty() || !seen.insert(item.id.clone()) {
            dropped += 1;
            continue;
        }
        kept.push(item);
    }

    (kept, dropped)
}

/// Pull one snapshot from every source and merge them.
/// A failing source is logged and skipped; the others still contribute.
pub async fn run_once(sources: &[Box<dyn SnapshotSource>]) -> Vec<NewsItem> {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for s in sources {
        match s.fetch_snapshot().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = s.name(), "source error");
                counter!("ingest_source_errors_total").increment(1);
            }
        }
    }

    let (kept, dropped) = normalize_snapshot(raw);

    let now = chrono::Utc::now().timestamp().max(0);
    counter!("ingest_snapshots_total").increment(1);
    counter!("ingest_items_dropped_total").increment(dropped as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);

    kept
}
