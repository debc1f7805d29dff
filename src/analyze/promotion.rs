//! Standalone-word promotion policy for trending extraction.
//!
//! A repeated word is normally surfaced only inside a bigram. It is promoted
//! to a standalone trending entry only when it looks like a strong proper
//! noun that either never pairs with another content word, or pairs with many
//! different ones.

/// Per-word counters gathered by the trending extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordStats {
    pub occurrences: usize,
    /// Capitalized occurrences not in first title position.
    pub capitalized: usize,
    /// Distinct bigrams the word takes part in.
    pub bigram_contexts: usize,
}

pub const MIN_CAPITALIZED: usize = 3;
pub const MIN_OCCURRENCES_ISOLATED: usize = 4;
pub const MIN_CONTEXTS_HUB: usize = 4;
pub const MIN_OCCURRENCES_HUB: usize = 5;

impl WordStats {
    /// Capitalized in at least half of its occurrences, and at least 3 times.
    pub fn is_strong_proper_noun(&self) -> bool {
        self.capitalized >= MIN_CAPITALIZED && self.capitalized * 2 >= self.occurrences
    }
}

pub fn should_promote(stats: &WordStats) -> bool {
    if !stats.is_strong_proper_noun() {
        return false;
    }
    let isolated =
        stats.bigram_contexts == 0 && stats.occurrences >= MIN_OCCURRENCES_ISOLATED;
    let hub =
        stats.bigram_contexts >= MIN_CONTEXTS_HUB && stats.occurrences >= MIN_OCCURRENCES_HUB;
    isolated || hub
}
