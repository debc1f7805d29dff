// src/analyze/mod.rs
//! Ranking pipeline entry: score every candidate once per epoch, interleave
//! fresh items, then run the diversity passes.

pub mod affinity;
pub mod diversity;
pub mod interleave;
pub mod promotion;
pub mod scoring;
pub mod stopwords;
pub mod trending;
pub mod weights;

use serde::Serialize;
use std::collections::HashSet;

use crate::ingest::types::NewsItem;
use crate::score_cache::ScoreCache;

// Re-export convenient types.
pub use crate::analyze::affinity::{build_profiles, build_profiles_from_json, AffinityProfile, Profiles};
pub use crate::analyze::interleave::{is_fresh, Pools};
pub use crate::analyze::scoring::{
    score_cached, score_item, FixedJitter, JitterSource, ScoreBreakdown, ScoreContext, UniformJitter,
};
pub use crate::analyze::trending::{extract_trending, TrendingKind, TrendingPhrase};
pub use crate::analyze::weights::ScoringWeights;

/// One entry of the ordered output handed to the UI boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub id: String,
    pub score: f32,
    pub source: String,
    pub category: String,
    /// Went through the fresh pool.
    pub fresh: bool,
    /// Pinned at the top for this render after a reveal.
    pub revealed: bool,
}

impl RankedItem {
    fn from_item(item: &NewsItem, score: f32) -> Self {
        Self {
            id: item.id.clone(),
            score,
            source: item.source.clone(),
            category: item.category.clone(),
            fresh: false,
            revealed: false,
        }
    }
}

/// Full ordering for `items`.
///
/// Every item is scored through `cache`, so a second call within the same
/// epoch sees the same numbers. Items in `just_revealed` lead the list
/// regardless of score.
pub fn rank(
    items: &[NewsItem],
    ctx: &ScoreContext<'_>,
    just_revealed: &HashSet<String>,
    cache: &mut ScoreCache,
    jitter: &mut dyn JitterSource,
) -> Vec<RankedItem> {
    let mut pools = Pools::default();

    for item in items {
        let score = score_cached(item, ctx, cache, jitter);
        let mut ranked = RankedItem::from_item(item, score);

        if just_revealed.contains(&item.id) {
            ranked.revealed = true;
            pools.revealed.push((ranked, item.published_ts()));
        } else if is_fresh(item, ctx) {
            ranked.fresh = true;
            pools.fresh.push(ranked);
        } else {
            pools.regular.push(ranked);
        }
    }

    tracing::debug!(
        target: "scoring",
        revealed = pools.revealed.len(),
        fresh = pools.fresh.len(),
        regular = pools.regular.len(),
        "ranking pools"
    );

    // The revealed block stays pinned: diversity swaps happen inside it and
    // inside the rest, never across the boundary.
    let pinned = pools.revealed.len();
    let mut assembled = interleave::assemble(pools);
    let rest = assembled.split_off(pinned);
    let mut out = diversity::enforce(assembled);
    out.extend(diversity::enforce(rest));
    out
}

/// `rank` reduced to ids.
pub fn rank_ids(
    items: &[NewsItem],
    ctx: &ScoreContext<'_>,
    cache: &mut ScoreCache,
    jitter: &mut dyn JitterSource,
) -> Vec<String> {
    rank(items, ctx, &HashSet::new(), cache, jitter)
        .into_iter()
        .map(|r| r.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::ItemCounters;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn item(id: &str, source: &str, age_min: i64) -> NewsItem {
        NewsItem {
            id: id.into(),
            title: format!("Story {id}"),
            summary: String::new(),
            source: source.into(),
            category: format!("cat-{id}"),
            published_at: Some((now() - Duration::minutes(age_min)).to_rfc3339()),
            link: String::new(),
            image_url: None,
            regions: vec![],
        }
    }

    #[test]
    fn fresh_item_reaches_the_lead_slots() {
        let mut items: Vec<_> = (0..10).map(|i| item(&format!("old{i}"), &format!("s{i}"), 600)).collect();
        items.push(item("breaking", "wire", 30));

        let profiles = Profiles::default();
        let counters: HashMap<String, ItemCounters> = HashMap::new();
        let shown = HashSet::new();
        let weights = ScoringWeights::default();
        let ctx = ScoreContext {
            now: now(),
            trending: &[],
            profiles: &profiles,
            counters: &counters,
            session_shown: &shown,
            weights: &weights,
        };

        let mut cache = ScoreCache::default();
        let out = rank(&items, &ctx, &HashSet::new(), &mut cache, &mut FixedJitter(0.0));
        assert_eq!(out[0].id, "breaking");
        assert!(out[0].fresh);
        assert_eq!(out.len(), 11);
    }

    #[test]
    fn ranking_twice_in_one_epoch_is_stable() {
        let items: Vec<_> = (0..8).map(|i| item(&format!("i{i}"), &format!("s{}", i % 3), i * 90)).collect();
        let profiles = Profiles::default();
        let counters = HashMap::new();
        let shown = HashSet::new();
        let weights = ScoringWeights::default();
        let ctx = ScoreContext {
            now: now(),
            trending: &[],
            profiles: &profiles,
            counters: &counters,
            session_shown: &shown,
            weights: &weights,
        };
        let mut cache = ScoreCache::default();
        let mut jitter = UniformJitter::seeded(3);
        let a = rank(&items, &ctx, &HashSet::new(), &mut cache, &mut jitter);
        let b = rank(&items, &ctx, &HashSet::new(), &mut cache, &mut jitter);
        assert_eq!(a, b);
    }
}
