use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::path::PathBuf;

use crate::ingest::types::{NewsItem, SnapshotSource};

/// Snapshot delivered as a JSON array of `NewsItem`, either a file that the
/// live-update transport rewrites in place or an inline fixture.
pub struct JsonSnapshotSource {
    mode: Mode,
}

enum Mode {
    File(PathBuf),
    Fixture(String),
}

impl JsonSnapshotSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::File(path.into()),
        }
    }

    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse(raw: &str) -> Result<Vec<NewsItem>> {
        serde_json::from_str(raw).context("snapshot: invalid JSON array of items")
    }
}

#[async_trait]
impl SnapshotSource for JsonSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<Vec<NewsItem>> {
        let t0 = std::time::Instant::now();
        let items = match &self.mode {
            Mode::Fixture(s) => Self::parse(s)?,
            Mode::File(p) => {
                let raw = tokio::fs::read_to_string(p)
                    .await
                    .with_context(|| format!("snapshot: reading {}", p.display()))?;
                Self::parse(&raw)?
            }
        };
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        counter!("ingest_items_total", "source" => self.name()).increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "json_snapshot"
    }
}
