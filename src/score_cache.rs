//! # Score Cache
//! Memoizes one final score per item for the lifetime of a ranking epoch.
//!
//! Shared counters (someone else's like arriving, a view being tracked) change
//! continuously while an item is on screen. Recomputing its score on every
//! render would reorder the visible feed, so the first score computed in an
//! epoch is returned verbatim until one of:
//! - `reset_epoch()` (filter switch, manual refresh),
//! - `invalidate(ids)` for exactly the items being revealed,
//! - the size bound being exceeded, which evicts the oldest half by insertion order.

use metrics::counter;
use std::collections::{HashMap, VecDeque};

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

#[derive(Debug)]
pub struct ScoreCache {
    scores: HashMap<String, f32>,
    /// Insertion order of the keys in `scores`.
    order: VecDeque<String>,
    capacity: usize,
    epoch: u64,
}

impl Default for ScoreCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ScoreCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(2),
            epoch: 0,
        }
    }

    /// Cached score for `item_id`, or `compute()` stored and returned.
    pub fn get_or_compute<F>(&mut self, item_id: &str, compute: F) -> f32
    where
        F: FnOnce() -> f32,
    {
        if let Some(&s) = self.scores.get(item_id) {
            counter!("feed_score_cache_hits_total").increment(1);
            return s;
        }
        counter!("feed_score_cache_misses_total").increment(1);

        let score = compute();
        self.scores.insert(item_id.to_string(), score);
        self.order.push_back(item_id.to_string());
        if self.scores.len() > self.capacity {
            self.evict_oldest_half();
        }
        score
    }

    pub fn get(&self, item_id: &str) -> Option<f32> {
        self.scores.get(item_id).copied()
    }

    /// Start a new epoch: every cached score is discarded.
    pub fn reset_epoch(&mut self) {
        self.scores.clear();
        self.order.clear();
        self.epoch += 1;
        counter!("feed_epoch_resets_total").increment(1);
    }

    /// Drop the entries for exactly these ids. Returns how many were present.
    pub fn invalidate<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut removed = 0;
        for id in ids {
            if self.scores.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            let scores = &self.scores;
            self.order.retain(|k| scores.contains_key(k));
        }
        removed
    }

    fn evict_oldest_half(&mut self) {
        let n = self.order.len() / 2;
        for key in self.order.drain(..n) {
            self.scores.remove(&key);
        }
        counter!("feed_score_cache_evictions_total").increment(n as u64);
        tracing::debug!(target: "session", evicted = n, remaining = self.scores.len(), "score cache trimmed");
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
