//! # Interactions
//! Per-item behavioral signals (views, rapid scroll-pasts, clicks, dwell) and
//! the user's likes, as kept by the persistence collaborator.
//!
//! The ranking core only *reads* an `InteractionLog` snapshot. Writes go through
//! the `InteractionSink` trait, which the session calls as a side effect when
//! items are displayed or opened. `InteractionStore` is the in-memory
//! implementation with JSON load/save.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::analyze::stopwords::keywords;
use crate::ingest::types::NewsItem;

/// Signals for one item. `source`/`category`/`keywords` are captured when
/// the item is first touched so profiles can be built without the item pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub item_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub rapid_scrolls: u32,
    #[serde(default)]
    pub clicks: u32,
    #[serde(default)]
    pub dwell_ms: u64,
    pub last_touch: DateTime<Utc>,
}

impl InteractionRecord {
    fn for_item(item: &NewsItem, now: DateTime<Utc>) -> Self {
        Self {
            item_id: item.id.clone(),
            source: item.source.clone(),
            category: item.category.clone(),
            keywords: keywords(&item.title),
            views: 0,
            rapid_scrolls: 0,
            clicks: 0,
            dwell_ms: 0,
            last_touch: now,
        }
    }
}

/// A like by the current user, as reported by the social backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeRecord {
    pub item_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub liked_at: DateTime<Utc>,
}

/// Read-only snapshot handed to the profile builders and the scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionLog {
    #[serde(default)]
    pub records: Vec<InteractionRecord>,
    #[serde(default)]
    pub likes: Vec<LikeRecord>,
    /// Aggregate like counts per item (all users). Informational.
    #[serde(default)]
    pub like_counts: HashMap<String, u64>,
}

/// What the scorer and interleaver need to know about one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounters {
    pub views: u32,
    pub rapid_scrolls: u32,
    pub clicked: bool,
}

impl InteractionLog {
    /// Parse a JSON log. Malformed input yields an empty log, never an error.
    pub fn from_json_str(s: &str) -> Self {
        match serde_json::from_str(s) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(target: "affinity", error = %e, "malformed interaction log, using empty");
                Self::default()
            }
        }
    }

    pub fn counters(&self) -> HashMap<String, ItemCounters> {
        self.records
            .iter()
            .map(|r| {
                (
                    r.item_id.clone(),
                    ItemCounters {
                        views: r.views,
                        rapid_scrolls: r.rapid_scrolls,
                        clicked: r.clicks > 0,
                    },
                )
            })
            .collect()
    }
}

/// Write API of the persistence collaborator.
pub trait InteractionSink {
    fn track_seen(&mut self, item: &NewsItem, now: DateTime<Utc>);
    fn track_click(&mut self, item: &NewsItem, now: DateTime<Utc>);
    fn track_dwell_time(&mut self, item: &NewsItem, dwell_ms: u64, now: DateTime<Utc>);
    fn track_rapid_scroll(&mut self, item: &NewsItem, now: DateTime<Utc>);
}

/// Sink that drops everything (previews, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl InteractionSink for NullSink {
    fn track_seen(&mut self, _item: &NewsItem, _now: DateTime<Utc>) {}
    fn track_click(&mut self, _item: &NewsItem, _now: DateTime<Utc>) {}
    fn track_dwell_time(&mut self, _item: &NewsItem, _dwell_ms: u64, _now: DateTime<Utc>) {}
    fn track_rapid_scroll(&mut self, _item: &NewsItem, _now: DateTime<Utc>) {}
}

pub const DEFAULT_STORE_CAPACITY: usize = 1000;

/// In-memory store, bounded to `cap` most-recently-touched records.
#[derive(Debug, Clone)]
pub struct InteractionStore {
    records: HashMap<String, InteractionRecord>,
    likes: Vec<LikeRecord>,
    like_counts: HashMap<String, u64>,
    cap: usize,
}

impl Default for InteractionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STORE_CAPACITY)
    }
}

impl InteractionStore {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            records: HashMap::new(),
            likes: Vec::new(),
            like_counts: HashMap::new(),
            cap: cap.clamp(1, 10_000),
        }
    }

    pub fn from_log(log: InteractionLog, cap: usize) -> Self {
        let mut s = Self::with_capacity(cap);
        for r in log.records {
            s.records.insert(r.item_id.clone(), r);
        }
        s.likes = log.likes;
        s.like_counts = log.like_counts;
        s.evict();
        s
    }

    /// Load a JSON log file. A missing file is an empty store; a malformed
    /// one is an empty store too (logged).
    pub fn load_from_file<P: AsRef<Path>>(path: P, cap: usize) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => Self::from_log(InteractionLog::from_json_str(&s), cap),
            Err(_) => Self::with_capacity(cap),
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&self.snapshot())?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Atomic read snapshot for one ranking pass.
    pub fn snapshot(&self) -> InteractionLog {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| b.last_touch.cmp(&a.last_touch).then(a.item_id.cmp(&b.item_id)));
        InteractionLog {
            records,
            likes: self.likes.clone(),
            like_counts: self.like_counts.clone(),
        }
    }

    pub fn record(&self, item_id: &str) -> Option<&InteractionRecord> {
        self.records.get(item_id)
    }

    pub fn is_liked(&self, item_id: &str) -> bool {
        self.likes.iter().any(|l| l.item_id == item_id)
    }

    /// Record a like; a repeated like for the same item is ignored.
    pub fn like(&mut self, item: &NewsItem, now: DateTime<Utc>) -> bool {
        if self.is_liked(&item.id) {
            return false;
        }
        self.likes.push(LikeRecord {
            item_id: item.id.clone(),
            source: item.source.clone(),
            category: item.category.clone(),
            keywords: keywords(&item.title),
            liked_at: now,
        });
        *self.like_counts.entry(item.id.clone()).or_insert(0) += 1;
        true
    }

    pub fn unlike(&mut self, item_id: &str) -> bool {
        let before = self.likes.len();
        self.likes.retain(|l| l.item_id != item_id);
        let removed = self.likes.len() != before;
        if removed {
            if let Some(c) = self.like_counts.get_mut(item_id) {
                *c = c.saturating_sub(1);
            }
        }
        removed
    }

    fn touch(&mut self, item: &NewsItem, now: DateTime<Utc>) -> &mut InteractionRecord {
        if !self.records.contains_key(&item.id) && self.records.len() >= self.cap {
            self.evict_one();
        }
        let rec = self
            .records
            .entry(item.id.clone())
            .or_insert_with(|| InteractionRecord::for_item(item, now));
        rec.last_touch = now;
        rec
    }

    fn evict_one(&mut self) {
        let oldest = self
            .records
            .values()
            .min_by(|a, b| a.last_touch.cmp(&b.last_touch).then(a.item_id.cmp(&b.item_id)))
            .map(|r| r.item_id.clone());
        if let Some(id) = oldest {
            self.records.remove(&id);
        }
    }

    fn evict(&mut self) {
        while self.records.len() > self.cap {
            self.evict_one();
        }
    }
}

impl InteractionSink for InteractionStore {
    fn track_seen(&mut self, item: &NewsItem, now: DateTime<Utc>) {
        self.touch(item, now).views += 1;
    }

    fn track_click(&mut self, item: &NewsItem, now: DateTime<Utc>) {
        self.touch(item, now).clicks += 1;
    }

    fn track_dwell_time(&mut self, item: &NewsItem, dwell_ms: u64, now: DateTime<Utc>) {
        let rec = self.touch(item, now);
        rec.dwell_ms = rec.dwell_ms.saturating_add(dwell_ms);
    }

    fn track_rapid_scroll(&mut self, item: &NewsItem, now: DateTime<Utc>) {
        self.touch(item, now).rapid_scrolls += 1;
    }
}
