//! Freshness interleaving.
//!
//! Breaking items have no accumulated affinity yet and would sink under
//! cold-start scoring. Assembly order:
//! 1. just-revealed items, newest first;
//! 2. the top `FRESH_LEAD` fresh items;
//! 3. `REGULAR_PER_FRESH` regular items, then 1 fresh, repeated until a pool runs out;
//! 4. whatever is left of the other pool, in score order.

use chrono::{DateTime, Duration, Utc};

use crate::analyze::scoring::ScoreContext;
use crate::analyze::RankedItem;
use crate::ingest::types::NewsItem;

pub const FRESH_WINDOW_MINUTES: i64 = 120;
pub const FRESH_MAX_VIEWS: u32 = 3;
pub const FRESH_LEAD: usize = 3;
pub const REGULAR_PER_FRESH: usize = 4;

/// Published under 2h ago, never clicked, viewed fewer than 3 times.
pub fn is_fresh(item: &NewsItem, ctx: &ScoreContext<'_>) -> bool {
    let Some(ts) = item.published_ts() else {
        return false;
    };
    if ctx.now - ts >= Duration::minutes(FRESH_WINDOW_MINUTES) {
        return false;
    }
    !ctx.is_clicked(&item.id) && ctx.counters_for(&item.id).views < FRESH_MAX_VIEWS
}

#[derive(Debug, Default)]
pub struct Pools {
    /// Just-revealed items with their publish time.
    pub revealed: Vec<(RankedItem, Option<DateTime<Utc>>)>,
    pub fresh: Vec<RankedItem>,
    pub regular: Vec<RankedItem>,
}

/// Score descending; ties by id so equal scores order deterministically.
pub fn sort_by_score(items: &mut [RankedItem]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}

pub fn assemble(pools: Pools) -> Vec<RankedItem> {
    let Pools {
        mut revealed,
        mut fresh,
        mut regular,
    } = pools;

    // Newest first; unknown publish time last.
    revealed.sort_by(|(a, ta), (b, tb)| tb.cmp(ta).then_with(|| a.id.cmp(&b.id)));
    sort_by_score(&mut fresh);
    sort_by_score(&mut regular);

    let mut out = Vec::with_capacity(revealed.len() + fresh.len() + regular.len());
    out.extend(revealed.into_iter().map(|(r, _)| r));

    let mut fresh = fresh.into_iter().peekable();
    let mut regular = regular.into_iter().peekable();

    out.extend(fresh.by_ref().take(FRESH_LEAD));

    while fresh.peek().is_some() && regular.peek().is_some() {
        out.extend(regular.by_ref().take(REGULAR_PER_FRESH));
        if let Some(f) = fresh.next() {
            out.push(f);
        }
    }

    out.extend(regular);
    out.extend(fresh);
    out
}
