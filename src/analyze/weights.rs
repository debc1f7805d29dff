//! Scoring weights and penalty magnitudes.
//!
//! TOML shape (section `[scoring]` of `config/feed.toml`):
//! ```toml
//! [scoring]
//! w_freshness = 0.40
//! w_trending = 0.25
//! w_like = 0.20
//! w_engagement = 0.15
//! seen_step = 0.15
//! seen_cap = 0.5
//! clicked_penalty = 0.6
//! shown_penalty = 0.3
//! floor = 0.01
//! jitter_max = 0.05
//! ```
//! Every field is optional; missing fields keep the defaults below.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub w_freshness: f32,
    pub w_trending: f32,
    pub w_like: f32,
    pub w_engagement: f32,
    /// Per-view seen penalty, capped at `seen_cap`.
    pub seen_step: f32,
    pub seen_cap: f32,
    pub clicked_penalty: f32,
    pub shown_penalty: f32,
    pub floor: f32,
    pub jitter_max: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            w_freshness: 0.40,
            w_trending: 0.25,
            w_like: 0.20,
            w_engagement: 0.15,
            seen_step: 0.15,
            seen_cap: 0.5,
            clicked_penalty: 0.6,
            shown_penalty: 0.3,
            floor: 0.01,
            jitter_max: 0.05,
        }
    }
}

impl ScoringWeights {
    /// Clamp everything into sane ranges. Negative magnitudes become 0,
    /// the floor stays strictly positive.
    pub fn sanitized(mut self) -> Self {
        fn nn(x: f32) -> f32 {
            if x.is_finite() {
                x.max(0.0)
            } else {
                0.0
            }
        }
        self.w_freshness = nn(self.w_freshness);
        self.w_trending = nn(self.w_trending);
        self.w_like = nn(self.w_like);
        self.w_engagement = nn(self.w_engagement);
        self.seen_step = nn(self.seen_step);
        self.seen_cap = nn(self.seen_cap);
        self.clicked_penalty = nn(self.clicked_penalty);
        self.shown_penalty = nn(self.shown_penalty);
        self.jitter_max = nn(self.jitter_max);
        if !(self.floor.is_finite() && self.floor > 0.0) {
            self.floor = Self::default().floor;
        }
        self
    }

    pub fn total(&self) -> f32 {
        self.w_freshness + self.w_trending + self.w_like + self.w_engagement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sum_to_one() {
        assert!((ScoringWeights::default().total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let w: ScoringWeights = toml::from_str("w_trending = 0.3\nfloor = -1.0").unwrap();
        let w = w.sanitized();
        assert!((w.w_trending - 0.3).abs() < 1e-6);
        assert!((w.w_freshness - 0.40).abs() < 1e-6);
        assert!((w.floor - 0.01).abs() < 1e-6);
    }
}
