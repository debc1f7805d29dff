//! # Feed Session
//! Window controller: owns the session state and runs the ranking pipeline
//! on each event (snapshot, reveal, filter switch, page advance, render).
//!
//! Visibility rule: after the first snapshot, newly arriving ids wait in
//! `pending` and are neither scored nor rendered until `reveal` (or a filter
//! switch) moves them to `just_revealed`, where they lead exactly one render.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::analyze::scoring::{JitterSource, ScoreContext, UniformJitter};
use crate::analyze::{build_profiles, extract_trending, rank, RankedItem, TrendingPhrase};
use crate::antiflutter::SettleGate;
use crate::config::FeedConfig;
use crate::debug::{anon_hash, dev_logging_enabled, truncate_vec};
use crate::ingest::types::NewsItem;
use crate::interactions::{InteractionLog, InteractionSink};
use crate::score_cache::ScoreCache;

pub type SharedSession = Arc<Mutex<FeedSession>>;

pub const DEFAULT_FILTER: &str = "all";

/// Emitted when pending items were moved to the top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealSignal {
    pub revealed: Vec<String>,
    pub scroll_to_top: bool,
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFeed {
    pub entries: Vec<RankedItem>,
    pub pending_count: usize,
    pub has_more: bool,
    pub epoch: u64,
    pub filter: String,
}

impl RenderedFeed {
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }
}

pub struct FeedSession {
    cfg: FeedConfig,
    /// Latest snapshot, in delivery order.
    pool: Vec<NewsItem>,
    /// Ids of the last applied snapshot.
    known: HashSet<String>,
    /// Arrival order.
    pending: Vec<String>,
    just_revealed: HashSet<String>,
    shown_order: VecDeque<String>,
    shown: HashSet<String>,
    display_count: usize,
    cache: ScoreCache,
    jitter: Box<dyn JitterSource>,
    reveal_gate: SettleGate,
    page_gate: SettleGate,
    filter: String,
    initialized: bool,
    last_trending: Vec<TrendingPhrase>,
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("pool", &self.pool.len())
            .field("pending", &self.pending.len())
            .field("shown", &self.shown.len())
            .field("display_count", &self.display_count)
            .field("epoch", &self.cache.epoch())
            .field("filter", &self.filter)
            .finish()
    }
}

impl FeedSession {
    pub fn new(cfg: FeedConfig) -> Self {
        Self::with_jitter(cfg, Box::new(UniformJitter::from_os()))
    }

    pub fn with_jitter(cfg: FeedConfig, jitter: Box<dyn JitterSource>) -> Self {
        let settle_ms = cfg.session.settle_ms;
        Self {
            display_count: cfg.session.page_size,
            cache: ScoreCache::with_capacity(cfg.session.cache_capacity),
            reveal_gate: SettleGate::new(settle_ms),
            page_gate: SettleGate::new(settle_ms),
            cfg,
            pool: Vec::new(),
            known: HashSet::new(),
            pending: Vec::new(),
            just_revealed: HashSet::new(),
            shown_order: VecDeque::new(),
            shown: HashSet::new(),
            jitter,
            filter: DEFAULT_FILTER.to_string(),
            initialized: false,
            last_trending: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Replace the pool with `items`. Returns the pending count afterwards.
    ///
    /// The first snapshot becomes visible directly. Later unseen ids are held
    /// back as pending; pending ids missing from `items` are dropped.
    pub fn apply_snapshot(&mut self, items: Vec<NewsItem>, now: DateTime<Utc>) -> usize {
        let incoming: HashSet<String> = items.iter().map(|i| i.id.clone()).collect();

        if !self.initialized {
            self.initialized = true;
        } else {
            for item in &items {
                if !self.known.contains(&item.id) && !self.pending.contains(&item.id) {
                    self.pending.push(item.id.clone());
                }
            }
        }
        self.pending.retain(|id| incoming.contains(id));
        self.just_revealed.retain(|id| incoming.contains(id));

        self.pool = items;
        self.known = incoming;

        gauge!("feed_pending_items").set(self.pending.len() as f64);
        tracing::debug!(
            target: "session",
            pool = self.pool.len(),
            pending = self.pending.len(),
            at = %now,
            "snapshot applied"
        );
        self.pending.len()
    }

    /// User-confirmed reveal. Duplicate triggers inside the settle window and
    /// reveals with nothing pending return `None`.
    pub fn reveal(&mut self, now: DateTime<Utc>) -> Option<RevealSignal> {
        if self.pending.is_empty() {
            return None;
        }
        if !self.reveal_gate.try_pass(now) {
            tracing::debug!(target: "session", "reveal suppressed inside settle window");
            return None;
        }
        Some(self.reveal_pending())
    }

    fn reveal_pending(&mut self) -> RevealSignal {
        let revealed = std::mem::take(&mut self.pending);
        self.cache.invalidate(revealed.iter().map(String::as_str));
        // Joined to `shown` by the render that displays them.
        self.just_revealed.extend(revealed.iter().cloned());
        gauge!("feed_pending_items").set(0.0);
        tracing::info!(target: "session", revealed = revealed.len(), "pending items revealed");
        RevealSignal {
            revealed,
            scroll_to_top: true,
        }
    }

    /// New view: fresh epoch, cursor back to one page, pending items shown
    /// without confirmation.
    pub fn switch_filter(&mut self, label: &str, now: DateTime<Utc>) -> Option<RevealSignal> {
        self.filter = label.trim().to_string();
        self.cache.reset_epoch();
        // Cursor restarts with the view; it only grows within one filter.
        self.display_count = self.cfg.session.page_size;
        tracing::info!(target: "session", filter = %self.filter, epoch = self.cache.epoch(), at = %now, "filter switched");
        if self.pending.is_empty() {
            None
        } else {
            Some(self.reveal_pending())
        }
    }

    /// Manual refresh: new epoch, same view.
    pub fn refresh(&mut self) {
        self.cache.reset_epoch();
    }

    /// Visibility sentinel fired. Advances the cursor by one page unless an
    /// advance is still settling or everything is already displayed.
    pub fn advance_page(&mut self, now: DateTime<Utc>) -> bool {
        if self.display_count >= self.visible_len() {
            return false;
        }
        if !self.page_gate.try_pass(now) {
            return false;
        }
        self.display_count += self.cfg.session.page_size;
        true
    }

    /// Run the pipeline over the visible pool and return the current window.
    pub fn render(
        &mut self,
        log: &InteractionLog,
        now: DateTime<Utc>,
        sink: &mut dyn InteractionSink,
    ) -> RenderedFeed {
        let visible = self.visible_items();
        let trending = extract_trending(&visible);
        let profiles = build_profiles(log, now, &self.cfg.profiles);
        let counters = log.counters();

        let ranked = {
            let ctx = ScoreContext {
                now,
                trending: &trending,
                profiles: &profiles,
                counters: &counters,
                session_shown: &self.shown,
                weights: &self.cfg.scoring,
            };
            rank(&visible, &ctx, &self.just_revealed, &mut self.cache, &mut *self.jitter)
        };

        let has_more = ranked.len() > self.display_count;
        let entries: Vec<RankedItem> = ranked.into_iter().take(self.display_count).collect();

        let by_id: HashMap<&str, &NewsItem> = visible.iter().map(|i| (i.id.as_str(), i)).collect();
        for e in &entries {
            let first_display = !self.shown.contains(&e.id) || self.just_revealed.contains(&e.id);
            if first_display {
                if let Some(item) = by_id.get(e.id.as_str()) {
                    sink.track_seen(item, now);
                }
            }
        }
        for e in &entries {
            self.remember_shown(&e.id);
        }
        self.just_revealed.clear();
        self.last_trending = trending;

        counter!("feed_render_passes_total").increment(1);
        gauge!("feed_pending_items").set(self.pending.len() as f64);
        self.dev_log_render(&entries, &by_id);

        RenderedFeed {
            entries,
            pending_count: self.pending.len(),
            has_more,
            epoch: self.cache.epoch(),
            filter: self.filter.clone(),
        }
    }

    /// Item opened. Returns false for ids not in the pool.
    pub fn open_item(&self, item_id: &str, now: DateTime<Utc>, sink: &mut dyn InteractionSink) -> bool {
        match self.find(item_id) {
            Some(item) => {
                sink.track_click(item, now);
                true
            }
            None => false,
        }
    }

    pub fn record_dwell(
        &self,
        item_id: &str,
        dwell_ms: u64,
        now: DateTime<Utc>,
        sink: &mut dyn InteractionSink,
    ) -> bool {
        match self.find(item_id) {
            Some(item) => {
                sink.track_dwell_time(item, dwell_ms, now);
                true
            }
            None => false,
        }
    }

    pub fn record_rapid_scroll(&self, item_id: &str, now: DateTime<Utc>, sink: &mut dyn InteractionSink) -> bool {
        match self.find(item_id) {
            Some(item) => {
                sink.track_rapid_scroll(item, now);
                true
            }
            None => false,
        }
    }

    fn remember_shown(&mut self, id: &str) {
        if !self.shown.insert(id.to_string()) {
            return;
        }
        self.shown_order.push_back(id.to_string());
        let s = &self.cfg.session;
        if self.shown_order.len() > s.shown_cap {
            while self.shown_order.len() > s.shown_trim_to {
                if let Some(old) = self.shown_order.pop_front() {
                    self.shown.remove(&old);
                }
            }
        }
    }

    fn dev_log_render(&self, entries: &[RankedItem], by_id: &HashMap<&str, &NewsItem>) {
        if !dev_logging_enabled() {
            return;
        }
        // Never log raw titles. Only hashed ids + short lists.
        let top: Vec<String> = entries
            .iter()
            .filter_map(|e| by_id.get(e.id.as_str()))
            .map(|i| anon_hash(&i.title))
            .collect();
        tracing::info!(
            target: "session",
            rendered = entries.len(),
            pending = self.pending.len(),
            epoch = self.cache.epoch(),
            top = ?truncate_vec(&top, 5),
            trending = ?truncate_vec(&self.last_trending.iter().map(|t| &t.text).collect::<Vec<_>>(), 5),
            "render"
        );
    }

    pub fn find(&self, item_id: &str) -> Option<&NewsItem> {
        self.pool.iter().find(|i| i.id == item_id)
    }

    /// Pool minus pending, in delivery order.
    pub fn visible_items(&self) -> Vec<NewsItem> {
        self.pool
            .iter()
            .filter(|i| !self.pending.contains(&i.id))
            .cloned()
            .collect()
    }

    fn visible_len(&self) -> usize {
        self.pool.len().saturating_sub(self.pending.len())
    }

    /// Trending phrases as of the last render.
    pub fn trending(&self) -> &[TrendingPhrase] {
        &self.last_trending
    }

    pub fn pending_ids(&self) -> &[String] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn shown_ids(&self) -> HashSet<String> {
        self.shown.clone()
    }

    pub fn shown_len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_shown(&self, item_id: &str) -> bool {
        self.shown.contains(item_id)
    }

    pub fn cached_score(&self, item_id: &str) -> Option<f32> {
        self.cache.get(item_id)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn epoch(&self) -> u64 {
        self.cache.epoch()
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn config(&self) -> &FeedConfig {
        &self.cfg
    }
}
