//! Diversity post-pass over the assembled order.
//!
//! Two local, single-pass heuristics, applied in this order:
//! - **source cap**: a run of more than `MAX_SOURCE_RUN` same-source items gets
//!   the first later item with a different source swapped in right after the
//!   first `MAX_SOURCE_RUN` of the run;
//! - **category cap**: an item whose category equals each of the previous
//!   `CATEGORY_WINDOW` items is swapped with the first later item of a
//!   different category.
//!
//! First match wins and nothing backtracks. When no swap candidate exists the
//! run is left as is.

use crate::analyze::RankedItem;

pub const MAX_SOURCE_RUN: usize = 2;
pub const CATEGORY_WINDOW: usize = 3;

pub fn cap_source_runs(items: &mut [RankedItem]) {
    let n = items.len();
    let mut i = 0;
    while i < n {
        let mut run = 1;
        while i + run < n && items[i + run].source == items[i].source {
            run += 1;
        }
        if run <= MAX_SOURCE_RUN {
            i += run;
            continue;
        }

        let slot = i + MAX_SOURCE_RUN;
        let candidate = (slot + 1..n).find(|&j| items[j].source != items[i].source);
        match candidate {
            Some(j) => {
                items.swap(slot, j);
                i = slot + 1;
            }
            None => i += run,
        }
    }
}

pub fn cap_category_runs(items: &mut [RankedItem]) {
    let n = items.len();
    for k in CATEGORY_WINDOW..n {
        let cat = items[k].category.clone();
        let saturated = items[k - CATEGORY_WINDOW..k].iter().all(|p| p.category == cat);
        if !saturated {
            continue;
        }
        if let Some(j) = (k + 1..n).find(|&j| items[j].category != cat) {
            items.swap(k, j);
        }
    }
}

/// Source cap, then category cap.
pub fn enforce(mut items: Vec<RankedItem>) -> Vec<RankedItem> {
    cap_source_runs(&mut items);
    cap_category_runs(&mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn it(id: &str, source: &str, category: &str) -> RankedItem {
        RankedItem {
            id: id.into(),
            score: 0.5,
            source: source.into(),
            category: category.into(),
            fresh: false,
            revealed: false,
        }
    }

    fn by_source(pattern: &str) -> Vec<RankedItem> {
        pattern.chars()
            .enumerate()
            .map(|(i, c)| it(&format!("{c}{i}"), &c.to_string(), &format!("cat{i}")))
            .collect()
    }

    fn sources(v: &[RankedItem]) -> String {
        v.iter().map(|i| i.source.as_str()).collect()
    }

    fn categories(v: &[RankedItem]) -> String {
        v.iter().map(|i| i.category.as_str()).collect()
    }

    #[test]
    fn long_run_gets_split() {
        let mut v = by_source("AAAABC");
        cap_source_runs(&mut v);
        assert_eq!(sources(&v), "AABAAC");
        // the displaced A keeps its identity
        assert_eq!(v[2].id, "B4");
        assert_eq!(v[3].id, "A3");
        assert_eq!(v[4].id, "A2");
    }

    #[test]
    fn repeated_splits_walk_forward() {
        let mut v = by_source("AAAAAABC");
        cap_source_runs(&mut v);
        assert_eq!(sources(&v), "AABAACAA");
    }

    #[test]
    fn no_candidate_leaves_run() {
        let mut v = by_source("BAAAA");
        cap_source_runs(&mut v);
        assert_eq!(sources(&v), "BAAAA");
    }

    #[test]
    fn short_runs_untouched() {
        let mut v = by_source("AABBAC");
        cap_source_runs(&mut v);
        assert_eq!(sources(&v), "AABBAC");
    }

    #[test]
    fn category_window_of_three() {
        let mut v: Vec<_> = "EEEEPE"
            .chars()
            .enumerate()
            .map(|(i, c)| it(&format!("i{i}"), &format!("s{i}"), &c.to_string()))
            .collect();
        cap_category_runs(&mut v);
        assert_eq!(categories(&v), "EEEPEE");
        assert_eq!(v[3].id, "i4");
    }

    #[test]
    fn category_without_alternative_is_accepted() {
        let mut v: Vec<_> = (0..5).map(|i| it(&format!("i{i}"), &format!("s{i}"), "E")).collect();
        cap_category_runs(&mut v);
        assert_eq!(categories(&v), "EEEEE");
    }
}
