//! Multi-signal item scoring.
//!
//! score = w_freshness·freshness + w_trending·trending
//!       + w_like·match(like) + w_engagement·match(engagement)
//!       − seen − clicked − shown, floored at `floor`,
//! plus one jitter draw in [0, jitter_max] when the score enters the cache.
//!
//! Scoring never fails as a whole: a component that errors or comes out
//! non-finite turns that one item's score into the floor.

use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::analyze::affinity::{AffinityProfile, Profiles};
use crate::analyze::stopwords::keywords;
use crate::analyze::trending::TrendingPhrase;
use crate::analyze::weights::ScoringWeights;
use crate::ingest::types::NewsItem;
use crate::interactions::ItemCounters;
use crate::score_cache::ScoreCache;

/// Neutral freshness for items without a usable publish time.
pub const UNKNOWN_FRESHNESS: f32 = 0.3;
/// How many of the top trending entries an item is matched against.
pub const TRENDING_SLOTS: usize = 3;

/// Everything an item is scored against, borrowed for one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    pub now: DateTime<Utc>,
    pub trending: &'a [TrendingPhrase],
    pub profiles: &'a Profiles,
    pub counters: &'a HashMap<String, ItemCounters>,
    pub session_shown: &'a HashSet<String>,
    pub weights: &'a ScoringWeights,
}

impl ScoreContext<'_> {
    pub fn counters_for(&self, item_id: &str) -> ItemCounters {
        self.counters.get(item_id).copied().unwrap_or_default()
    }

    /// Clicked according to either the raw counters or the engagement profile.
    pub fn is_clicked(&self, item_id: &str) -> bool {
        self.counters_for(item_id).clicked || self.profiles.engagement.has_acted(item_id)
    }
}

/// Component values, exposed for debugging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub freshness: f32,
    pub trending: f32,
    pub like: f32,
    pub engagement: f32,
    pub penalty: f32,
    /// Weighted sum minus penalties, floored. No jitter.
    pub total: f32,
}

/// Step function over item age.
pub fn freshness_score(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    let Some(ts) = published else {
        return UNKNOWN_FRESHNESS;
    };
    let age_min = (now - ts).num_minutes().max(0);
    match age_min {
        m if m < 60 => 1.0,
        m if m < 3 * 60 => 0.9,
        m if m < 6 * 60 => 0.8,
        m if m < 12 * 60 => 0.6,
        m if m < 24 * 60 => 0.4,
        m if m < 48 * 60 => 0.25,
        _ => 0.10,
    }
}

/// Share of the top 3 trending entries found in the item text.
pub fn trending_match(item: &NewsItem, trending: &[TrendingPhrase]) -> f32 {
    let hay = item.haystack();
    let matches = trending
        .iter()
        .take(TRENDING_SLOTS)
        .filter(|t| hay.contains(t.text.as_str()))
        .count();
    (matches as f32 / TRENDING_SLOTS as f32).min(1.0)
}

/// Source (≤0.3) + category (≤0.3) + keyword overlap (≤0.4).
pub fn profile_match(item: &NewsItem, item_keywords: &[String], profile: &AffinityProfile) -> f32 {
    let source = (profile.source_weight(&item.source) / 5.0).min(1.0) * 0.3;
    let category = (profile.category_weight(&item.category) / 3.0).min(1.0) * 0.3;
    let kw = (profile.matched_keywords(item_keywords) as f32 / 3.0).min(1.0) * 0.4;
    source + category + kw
}

fn finite(name: &str, v: f32) -> Result<f32> {
    ensure!(v.is_finite(), "{name} component is not finite ({v})");
    Ok(v)
}

/// Full breakdown for one item. Errors only on non-finite components.
pub fn compose(item: &NewsItem, ctx: &ScoreContext<'_>) -> Result<ScoreBreakdown> {
    let w = ctx.weights;
    let kws = keywords(&item.title);

    let freshness = finite("freshness", freshness_score(item.published_ts(), ctx.now))?;
    let trending = finite("trending", trending_match(item, ctx.trending))?;
    let like = finite("like", profile_match(item, &kws, &ctx.profiles.like))?;
    let engagement = finite("engagement", profile_match(item, &kws, &ctx.profiles.engagement))?;

    let counters = ctx.counters_for(&item.id);
    let mut penalty = (counters.views as f32 * w.seen_step).min(w.seen_cap);
    if ctx.profiles.engagement.has_acted(&item.id) {
        penalty += w.clicked_penalty;
    }
    if ctx.session_shown.contains(&item.id) {
        penalty += w.shown_penalty;
    }
    let penalty = finite("penalty", penalty)?;

    let weighted = w.w_freshness * freshness
        + w.w_trending * trending
        + w.w_like * like
        + w.w_engagement * engagement;
    // f32::max swallows NaN, so check before flooring
    let weighted = finite("weighted", weighted)?;
    let total = (weighted - penalty).max(w.floor);

    Ok(ScoreBreakdown {
        freshness,
        trending,
        like,
        engagement,
        penalty,
        total,
    })
}

/// Uncached, jitter-free score. Failures degrade to the floor.
pub fn score_item(item: &NewsItem, ctx: &ScoreContext<'_>) -> f32 {
    match compose(item, ctx) {
        Ok(b) => b.total,
        Err(e) => {
            tracing::warn!(target: "scoring", item = %item.id, error = %e, "score fell back to floor");
            counter!("feed_score_failures_total").increment(1);
            ctx.weights.floor
        }
    }
}

/// Cached score: computed once per item per epoch, jitter included.
pub fn score_cached(
    item: &NewsItem,
    ctx: &ScoreContext<'_>,
    cache: &mut ScoreCache,
    jitter: &mut dyn JitterSource,
) -> f32 {
    cache.get_or_compute(&item.id, || match compose(item, ctx) {
        Ok(b) => b.total + jitter.draw(ctx.weights.jitter_max),
        Err(e) => {
            tracing::warn!(target: "scoring", item = %item.id, error = %e, "score fell back to floor");
            counter!("feed_score_failures_total").increment(1);
            ctx.weights.floor
        }
    })
}

/// Source of the per-item tie-breaking jitter.
pub trait JitterSource: Send {
    /// One draw in `[0, max]`.
    fn draw(&mut self, max: f32) -> f32;
}

/// Uniform jitter from a seedable RNG.
#[derive(Debug)]
pub struct UniformJitter {
    rng: StdRng,
}

impl UniformJitter {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl JitterSource for UniformJitter {
    fn draw(&mut self, max: f32) -> f32 {
        if max <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(0.0..=max)
    }
}

/// Constant jitter, clamped into `[0, max]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f32);

impl JitterSource for FixedJitter {
    fn draw(&mut self, max: f32) -> f32 {
        self.0.clamp(0.0, max.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::trending::TrendingKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn item(id: &str, title: &str, age_min: Option<i64>) -> NewsItem {
        NewsItem {
            id: id.into(),
            title: title.into(),
            summary: String::new(),
            source: "Reuters".into(),
            category: "economy".into(),
            published_at: age_min.map(|m| (now() - Duration::minutes(m)).to_rfc3339()),
            link: String::new(),
            image_url: None,
            regions: vec![],
        }
    }

    fn phrase(t: &str) -> TrendingPhrase {
        TrendingPhrase {
            text: t.into(),
            count: 2,
            kind: TrendingKind::Phrase,
        }
    }

    struct Fixture {
        trending: Vec<TrendingPhrase>,
        profiles: Profiles,
        counters: HashMap<String, ItemCounters>,
        shown: HashSet<String>,
        weights: ScoringWeights,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                trending: vec![phrase("gulf tensions"), phrase("oil prices"), phrase("rate cut")],
                profiles: Profiles::default(),
                counters: HashMap::new(),
                shown: HashSet::new(),
                weights: ScoringWeights::default(),
            }
        }

        fn ctx(&self) -> ScoreContext<'_> {
            ScoreContext {
                now: now(),
                trending: &self.trending,
                profiles: &self.profiles,
                counters: &self.counters,
                session_shown: &self.shown,
                weights: &self.weights,
            }
        }
    }

    #[test]
    fn freshness_steps() {
        let n = now();
        let at = |m: i64| freshness_score(Some(n - Duration::minutes(m)), n);
        assert_eq!(at(30), 1.0);
        assert_eq!(at(61), 0.9);
        assert_eq!(at(200), 0.8);
        assert_eq!(at(7 * 60), 0.6);
        assert_eq!(at(13 * 60), 0.4);
        assert_eq!(at(30 * 60), 0.25);
        assert_eq!(at(72 * 60), 0.10);
        assert_eq!(at(-30), 1.0);
        assert_eq!(freshness_score(None, n), UNKNOWN_FRESHNESS);
    }

    #[test]
    fn two_of_three_trending_matches() {
        let f = Fixture::new();
        let it = item("a", "Oil prices jump as Gulf tensions rise", Some(30));
        let b = compose(&it, &f.ctx()).unwrap();
        assert!((b.trending - 2.0 / 3.0).abs() < 1e-6);
        assert!((b.total - 0.5667).abs() < 1e-3);
    }

    #[test]
    fn unparseable_timestamp_is_neutral() {
        let f = Fixture::new();
        let mut it = item("a", "Quiet day", None);
        it.published_at = Some("not a date".into());
        let b = compose(&it, &f.ctx()).unwrap();
        assert_eq!(b.freshness, UNKNOWN_FRESHNESS);
        assert!((b.total - 0.12).abs() < 1e-6);
    }

    #[test]
    fn penalties_stack_and_floor_holds() {
        let mut f = Fixture::new();
        f.counters.insert(
            "a".into(),
            ItemCounters {
                views: 10,
                rapid_scrolls: 0,
                clicked: true,
            },
        );
        f.profiles.engagement.acted.insert("a".into());
        f.shown.insert("a".into());
        let it = item("a", "Old news", Some(72 * 60));
        let b = compose(&it, &f.ctx()).unwrap();
        assert!((b.penalty - (0.5 + 0.6 + 0.3)).abs() < 1e-6);
        assert_eq!(b.total, 0.01);
    }

    #[test]
    fn profile_match_caps_at_one() {
        let mut p = AffinityProfile::default();
        p.sources.insert("reuters".into(), 50.0);
        p.categories.insert("economy".into(), 50.0);
        for k in ["central", "bank", "holds", "rates"] {
            p.keywords.insert(k.into(), 1.0);
        }
        let it = item("a", "Central bank holds rates", Some(10));
        let kws = keywords(&it.title);
        assert!((profile_match(&it, &kws, &p) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn nan_weight_degrades_to_floor() {
        let mut f = Fixture::new();
        f.weights.w_trending = f32::NAN;
        let it = item("a", "Oil prices jump", Some(10));
        assert!(compose(&it, &f.ctx()).is_err());
        assert_eq!(score_item(&it, &f.ctx()), f.weights.floor);
    }

    #[test]
    fn cached_score_includes_jitter_once() {
        let f = Fixture::new();
        let mut cache = ScoreCache::default();
        let it = item("a", "Oil prices jump as Gulf tensions rise", Some(30));
        let s1 = score_cached(&it, &f.ctx(), &mut cache, &mut FixedJitter(0.05));
        let s2 = score_cached(&it, &f.ctx(), &mut cache, &mut FixedJitter(0.0));
        assert_eq!(s1, s2);
        assert!(s1 >= 0.566 && s1 <= 0.617);
    }

    #[test]
    fn uniform_jitter_stays_in_range() {
        let mut j = UniformJitter::seeded(7);
        for _ in 0..1000 {
            let d = j.draw(0.05);
            assert!((0.0..=0.05).contains(&d));
        }
        assert_eq!(j.draw(0.0), 0.0);
    }
}
