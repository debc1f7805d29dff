// src/config/feed.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::weights::ScoringWeights;

pub const DEFAULT_FEED_CONFIG_PATH: &str = "config/feed.toml";
pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_PAGE_SIZE: &str = "FEED_PAGE_SIZE";
pub const ENV_SETTLE_MS: &str = "FEED_SETTLE_MS";
/// Upper bound for `profiles.history_days`.
pub const MAX_HISTORY_DAYS: i64 = 3650;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub scoring: ScoringWeights,
    pub session: SessionSection,
    pub profiles: ProfileSection,
    pub ingest: IngestSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub page_size: usize,
    /// Collapses duplicate reveal / pagination triggers.
    pub settle_ms: i64,
    pub cache_capacity: usize,
    /// Shown-set bound; when exceeded it is trimmed back to `shown_trim_to`.
    pub shown_cap: usize,
    pub shown_trim_to: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            page_size: 20,
            settle_ms: 300,
            cache_capacity: 1000,
            shown_cap: 500,
            shown_trim_to: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileSection {
    pub history_days: i64,
    pub max_tracked: usize,
    /// Dwell above this counts as one meaningful read.
    pub meaningful_dwell_ms: u64,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            history_days: 7,
            max_tracked: 200,
            meaningful_dwell_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    pub interval_secs: u64,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl FeedConfig {
    /// Load using env var + fallbacks:
    /// 1) $FEED_CONFIG_PATH (must exist)
    /// 2) config/feed.toml
    /// 3) built-in defaults
    ///
    /// `FEED_PAGE_SIZE` / `FEED_SETTLE_MS` override the file afterwards.
    pub fn load_default() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_FEED_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    anyhow::bail!("{ENV_FEED_CONFIG_PATH} points to non-existent path");
                }
                Self::load_from(&pb)?
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_FEED_CONFIG_PATH);
                if pb.exists() {
                    Self::load_from(&pb)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(n) = parse_env::<usize>(ENV_PAGE_SIZE) {
            cfg.session.page_size = n;
        }
        if let Some(ms) = parse_env::<i64>(ENV_SETTLE_MS) {
            cfg.session.settle_ms = ms;
        }
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing feed config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: FeedConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.scoring = self.scoring.sanitized();
        let s = &mut self.session;
        s.page_size = s.page_size.max(1);
        s.settle_ms = s.settle_ms.max(0);
        s.cache_capacity = s.cache_capacity.max(2);
        s.shown_cap = s.shown_cap.max(1);
        s.shown_trim_to = s.shown_trim_to.clamp(1, s.shown_cap);
        let p = &mut self.profiles;
        p.history_days = p.history_days.clamp(0, MAX_HISTORY_DAYS);
        p.max_tracked = p.max_tracked.max(1);
        self.ingest.interval_secs = self.ingest.interval_secs.max(1);
        self
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
