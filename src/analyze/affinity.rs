//! Affinity profiles built from the interaction log.
//!
//! Two independent profiles come out of one log:
//! - `like`: one unit of weight per like reported by the social backend.
//! - `engagement`: clicks plus one "meaningful read" when cumulative dwell
//!   exceeds the configured threshold (5 s by default).
//!
//! Before aggregation the log is filtered to the last `history_days` and
//! capped to the `max_tracked` most recently touched items. Profiles are
//! rebuilt from scratch on every load and never mutated afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::config::feed::MAX_HISTORY_DAYS;
use crate::config::ProfileSection;
use crate::interactions::InteractionLog;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AffinityProfile {
    pub sources: HashMap<String, f32>,
    pub categories: HashMap<String, f32>,
    pub keywords: HashMap<String, f32>,
    /// Items already acted upon (liked / clicked-or-read).
    pub acted: HashSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profiles {
    pub like: AffinityProfile,
    pub engagement: AffinityProfile,
}

fn norm_key(s: &str) -> String {
    s.trim().to_lowercase()
}

impl AffinityProfile {
    fn add(&mut self, item_id: &str, source: &str, category: &str, keywords: &[String], w: f32) {
        if w <= 0.0 {
            return;
        }
        let src = norm_key(source);
        if !src.is_empty() {
            *self.sources.entry(src).or_insert(0.0) += w;
        }
        let cat = norm_key(category);
        if !cat.is_empty() {
            *self.categories.entry(cat).or_insert(0.0) += w;
        }
        for k in keywords {
            let k = norm_key(k);
            if !k.is_empty() {
                *self.keywords.entry(k).or_insert(0.0) += w;
            }
        }
        self.acted.insert(item_id.to_string());
    }

    pub fn source_weight(&self, source: &str) -> f32 {
        self.sources.get(&norm_key(source)).copied().unwrap_or(0.0)
    }

    pub fn category_weight(&self, category: &str) -> f32 {
        self.categories.get(&norm_key(category)).copied().unwrap_or(0.0)
    }

    /// How many of `keywords` the profile has seen at least once.
    pub fn matched_keywords(&self, keywords: &[String]) -> usize {
        keywords
            .iter()
            .filter(|k| self.keywords.get(&norm_key(k)).is_some_and(|&w| w > 0.0))
            .count()
    }

    pub fn has_acted(&self, item_id: &str) -> bool {
        self.acted.contains(item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.acted.is_empty()
    }
}

/// Build both profiles from one log snapshot.
pub fn build_profiles(log: &InteractionLog, now: DateTime<Utc>, cfg: &ProfileSection) -> Profiles {
    let cutoff = now - Duration::days(cfg.history_days.clamp(0, MAX_HISTORY_DAYS));

    // Engagement: recent records, most recently touched first, bounded.
    let mut recent: Vec<_> = log.records.iter().filter(|r| r.last_touch >= cutoff).collect();
    recent.sort_by(|a, b| b.last_touch.cmp(&a.last_touch).then(a.item_id.cmp(&b.item_id)));
    recent.truncate(cfg.max_tracked);

    let mut engagement = AffinityProfile::default();
    for r in &recent {
        let meaningful_read = if r.dwell_ms > cfg.meaningful_dwell_ms { 1.0 } else { 0.0 };
        let w = r.clicks as f32 + meaningful_read;
        engagement.add(&r.item_id, &r.source, &r.category, &r.keywords, w);
    }

    // Likes: same window and bound.
    let mut likes: Vec<_> = log.likes.iter().filter(|l| l.liked_at >= cutoff).collect();
    likes.sort_by(|a, b| b.liked_at.cmp(&a.liked_at).then(a.item_id.cmp(&b.item_id)));
    let mut seen = HashSet::new();
    likes.retain(|l| seen.insert(l.item_id.as_str()));
    likes.truncate(cfg.max_tracked);

    let mut like = AffinityProfile::default();
    for l in &likes {
        like.add(&l.item_id, &l.source, &l.category, &l.keywords, 1.0);
    }

    tracing::debug!(
        target: "affinity",
        liked = like.acted.len(),
        engaged = engagement.acted.len(),
        considered = recent.len(),
        "profiles built"
    );

    Profiles { like, engagement }
}

/// Profiles straight from raw JSON. Malformed input gives empty profiles.
pub fn build_profiles_from_json(raw: &str, now: DateTime<Utc>, cfg: &ProfileSection) -> Profiles {
    build_profiles(&InteractionLog::from_json_str(raw), now, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::{InteractionRecord, LikeRecord};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 10, 12, 0, 0).unwrap()
    }

    fn rec(id: &str, src: &str, clicks: u32, dwell_ms: u64, age_h: i64) -> InteractionRecord {
        InteractionRecord {
            item_id: id.into(),
            source: src.into(),
            category: "Economy".into(),
            keywords: vec!["oil".into(), "prices".into()],
            views: 1,
            rapid_scrolls: 0,
            clicks,
            dwell_ms,
            last_touch: now() - Duration::hours(age_h),
        }
    }

    #[test]
    fn clicks_and_meaningful_reads_feed_engagement() {
        let log = InteractionLog {
            records: vec![
                rec("a", "Reuters", 2, 0, 1),
                rec("b", "Reuters", 0, 6_000, 2),
                rec("c", "Reuters", 0, 5_000, 3), // exactly 5s is not "meaningful"
            ],
            ..Default::default()
        };
        let p = build_profiles(&log, now(), &ProfileSection::default());
        assert!((p.engagement.source_weight("reuters") - 3.0).abs() < 1e-6);
        assert!((p.engagement.category_weight("economy") - 3.0).abs() < 1e-6);
        assert!(p.engagement.has_acted("a"));
        assert!(p.engagement.has_acted("b"));
        assert!(!p.engagement.has_acted("c"));
        assert!(p.like.is_empty());
    }

    #[test]
    fn old_entries_are_ignored() {
        let log = InteractionLog {
            records: vec![rec("old", "Reuters", 5, 0, 24 * 8)],
            likes: vec![LikeRecord {
                item_id: "l".into(),
                source: "Folha".into(),
                category: "politics".into(),
                keywords: vec![],
                liked_at: now() - Duration::days(8),
            }],
            ..Default::default()
        };
        let p = build_profiles(&log, now(), &ProfileSection::default());
        assert!(p.engagement.is_empty());
        assert!(p.like.is_empty());
    }

    #[test]
    fn oversized_history_window_is_capped() {
        let log = InteractionLog {
            records: vec![rec("a", "A", 1, 0, 24 * 30)],
            ..Default::default()
        };
        let cfg = ProfileSection {
            history_days: i64::MAX,
            ..Default::default()
        };
        let p = build_profiles(&log, now(), &cfg);
        assert!(p.engagement.has_acted("a"));
    }

    #[test]
    fn only_most_recent_records_are_considered() {
        let log = InteractionLog {
            records: vec![
                rec("a", "A", 1, 0, 1),
                rec("b", "B", 1, 0, 2),
                rec("c", "C", 1, 0, 3),
            ],
            ..Default::default()
        };
        let cfg = ProfileSection {
            max_tracked: 2,
            ..Default::default()
        };
        let p = build_profiles(&log, now(), &cfg);
        assert!(p.engagement.has_acted("a"));
        assert!(p.engagement.has_acted("b"));
        assert!(!p.engagement.has_acted("c"));
        assert_eq!(p.engagement.source_weight("c"), 0.0);
    }

    #[test]
    fn likes_weigh_one_each() {
        let like = |id: &str| LikeRecord {
            item_id: id.into(),
            source: "Folha".into(),
            category: "Politics".into(),
            keywords: vec!["Lula".into()],
            liked_at: now() - Duration::hours(1),
        };
        let log = InteractionLog {
            likes: vec![like("x"), like("y"), like("y")],
            ..Default::default()
        };
        let p = build_profiles(&log, now(), &ProfileSection::default());
        assert!((p.like.source_weight("Folha") - 2.0).abs() < 1e-6);
        assert_eq!(p.like.matched_keywords(&["lula".into(), "brasil".into()]), 1);
        assert!(p.engagement.is_empty());
    }

    #[test]
    fn garbage_json_gives_empty_profiles() {
        let p = build_profiles_from_json("[1,2,", now(), &ProfileSection::default());
        assert_eq!(p, Profiles::default());
    }
}
