//! Trending phrase extraction over the visible item pool.
//!
//! Bigrams come first: any adjacent pair of content words seen at least twice
//! is a candidate phrase. Single words only surface on their own when the
//! promotion policy (`promotion::should_promote`) accepts them. A redundancy
//! pass then removes words explained by a phrase and phrases dominated by a
//! word, and the list is capped at `MAX_TRENDING`.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::analyze::promotion::{should_promote, WordStats};
use crate::analyze::stopwords::{is_content_word, tokenize_title};
use crate::ingest::types::NewsItem;

pub const MAX_TRENDING: usize = 20;
pub const MIN_BIGRAM_COUNT: usize = 2;
/// A standalone word is dropped when a kept bigram containing it reaches this share of its count.
pub const WORD_REDUNDANCY_RATIO: f32 = 0.6;
/// A bigram is dropped when one of its kept standalone words has this many times its count.
pub const BIGRAM_DOMINANCE_RATIO: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingKind {
    Phrase,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingPhrase {
    pub text: String,
    pub count: usize,
    pub kind: TrendingKind,
}

#[derive(Debug, Default)]
struct Bigram {
    first: String,
    second: String,
    count: usize,
}

#[derive(Debug, Default)]
struct Counts {
    bigrams: HashMap<String, Bigram>,
    words: HashMap<String, WordStats>,
    contexts: HashMap<String, HashSet<String>>,
}

fn count_titles<'a>(titles: impl IntoIterator<Item = &'a str>) -> Counts {
    let mut c = Counts::default();

    for title in titles {
        let tokens = tokenize_title(title);

        for pair in tokens.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if !is_content_word(&a.lower) || !is_content_word(&b.lower) {
                continue;
            }
            let key = format!("{} {}", a.lower, b.lower);
            c.contexts.entry(a.lower.clone()).or_default().insert(key.clone());
            c.contexts.entry(b.lower.clone()).or_default().insert(key.clone());
            let bg = c.bigrams.entry(key).or_insert_with(|| Bigram {
                first: a.lower.clone(),
                second: b.lower.clone(),
                count: 0,
            });
            bg.count += 1;
        }

        for t in &tokens {
            if t.lower.chars().count() < 4 || !is_content_word(&t.lower) {
                continue;
            }
            let ws = c.words.entry(t.lower.clone()).or_default();
            ws.occurrences += 1;
            if t.capitalized && t.position > 0 {
                ws.capitalized += 1;
            }
        }
    }

    for (word, ws) in c.words.iter_mut() {
        ws.bigram_contexts = c.contexts.get(word).map_or(0, HashSet::len);
    }
    c
}

/// Up to 20 trending phrases/words mined from the titles of `items`.
pub fn extract_trending(items: &[NewsItem]) -> Vec<TrendingPhrase> {
    extract_trending_from_titles(items.iter().map(|i| i.title.as_str()))
}

pub fn extract_trending_from_titles<'a>(
    titles: impl IntoIterator<Item = &'a str>,
) -> Vec<TrendingPhrase> {
    let counts = count_titles(titles);

    let kept_bigrams: Vec<&Bigram> = counts
        .bigrams
        .values()
        .filter(|b| b.count >= MIN_BIGRAM_COUNT)
        .collect();

    let best_bigram_for = |word: &str| -> usize {
        kept_bigrams
            .iter()
            .filter(|b| b.first == word || b.second == word)
            .map(|b| b.count)
            .max()
            .unwrap_or(0)
    };

    // Promoted words, minus those fully consumed by a kept bigram, minus
    // those a kept bigram already mostly explains.
    let mut standalone: HashMap<&str, usize> = HashMap::new();
    for (word, ws) in &counts.words {
        if !should_promote(ws) {
            continue;
        }
        let best = best_bigram_for(word);
        if best >= ws.occurrences {
            continue;
        }
        if best as f32 >= WORD_REDUNDANCY_RATIO * ws.occurrences as f32 {
            continue;
        }
        standalone.insert(word.as_str(), ws.occurrences);
    }

    let dominated = |b: &Bigram| -> bool {
        [&b.first, &b.second].iter().any(|w| {
            standalone
                .get(w.as_str())
                .is_some_and(|&wc| wc >= BIGRAM_DOMINANCE_RATIO * b.count)
        })
    };

    let mut out: Vec<TrendingPhrase> = kept_bigrams
        .iter()
        .filter(|b| !dominated(b))
        .map(|b| TrendingPhrase {
            text: format!("{} {}", b.first, b.second),
            count: b.count,
            kind: TrendingKind::Phrase,
        })
        .chain(standalone.iter().map(|(w, &count)| TrendingPhrase {
            text: (*w).to_string(),
            count,
            kind: TrendingKind::Word,
        }))
        .collect();

    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.text.cmp(&b.text))
    });
    out.truncate(MAX_TRENDING);

    tracing::debug!(
        target: "trending",
        phrases = out.iter().filter(|p| p.kind == TrendingKind::Phrase).count(),
        words = out.iter().filter(|p| p.kind == TrendingKind::Word).count(),
        "trending extracted"
    );
    out
}
