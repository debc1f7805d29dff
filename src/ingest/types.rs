// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

/// One short news item as delivered by the live-update transport.
///
/// Items are immutable once ingested: every snapshot replaces the visible
/// pool wholesale, nothing patches an item in place.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub source: String, // e.g., "Reuters", "Folha"
    #[serde(default)]
    pub category: String, // e.g., "economy", "politics"
    /// Raw publish time: RFC 3339, or unix seconds / milliseconds as a string.
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl NewsItem {
    /// Parsed publish time, `None` when missing or unparseable.
    pub fn published_ts(&self) -> Option<DateTime<Utc>> {
        self.published_at.as_deref().and_then(parse_timestamp)
    }

    /// Lowercased `title + " " + summary`, used for substring matching.
    pub fn haystack(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }
}

/// Accepts RFC 3339 (`2025-09-06T09:00:00Z`) or a plain integer.
/// Integers above 10^12 are treated as milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let n: i64 = s.parse().ok()?;
    if n.unsigned_abs() >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

/// Push side of the live-update transport. Each call yields one snapshot.
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &'static str;
}
