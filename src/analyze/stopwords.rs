//! Headline tokenizer and the combined English/Portuguese/Spanish stop-word list.
//!
//! Shared by the trending extractor and by keyword derivation for scoring and
//! affinity profiles, so both sides agree on what a "keyword" is.

use once_cell::sync::Lazy;
use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "his", "how", "its", "may", "new", "now", "old", "see",
    "two", "who", "why", "did", "get", "got", "let", "say", "says", "said", "she", "too", "use",
    "way", "yet", "off", "own", "per", "via", "amid", "after", "again", "against", "also",
    "about", "above", "across", "along", "among", "around", "before", "behind", "below",
    "between", "beyond", "during", "from", "into", "onto", "over", "since", "than", "that",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "under",
    "until", "upon", "what", "when", "where", "which", "while", "will", "with", "within",
    "without", "would", "could", "should", "been", "being", "were", "more", "most", "much",
    "many", "some", "such", "only", "just", "very", "here", "each", "other", "your", "ours",
    "does", "done", "make", "makes", "made", "like", "back", "down", "still", "even", "first",
    "last", "year", "years", "week", "today", "news", "report", "reports", "update", "live",
    // Portuguese
    "que", "com", "por", "para", "uma", "uns", "umas", "dos", "das", "nos", "nas", "pelo",
    "pela", "pelos", "pelas", "como", "mais", "mas", "foi", "são", "ser", "tem", "têm", "sobre",
    "entre", "após", "até", "sem", "seu", "sua", "seus", "suas", "ele", "ela", "eles", "elas",
    "isso", "este", "esta", "esse", "essa", "aos", "não", "sim", "também", "quando", "onde",
    "porque", "ainda", "já", "diz", "dizem", "contra", "desde", "durante", "muito", "novo",
    "nova", "hoje", "ano", "anos", "está", "estão", "vai", "vão", "pode", "podem", "deve",
    // Spanish
    "los", "las", "del", "con", "una", "unos", "unas", "por", "para", "como", "más", "pero",
    "sus", "fue", "son", "ser", "hay", "sobre", "entre", "tras", "hasta", "sin", "este", "esta",
    "ese", "esa", "eso", "ante", "bajo", "desde", "donde", "cuando", "porque", "también",
    "según", "dice", "dicen", "muy", "nuevo", "nueva", "hoy", "año", "años", "está", "están",
    "puede", "pueden", "debe", "contra", "durante", "otro", "otra", "todo", "todos", "todas",
];

static STOP_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOP_WORDS.iter().copied().collect());

const VOWELS: &str = "aeiouáàâãäéèêëíìîïóòôõöúùûüý";

pub fn is_stop_word(lower: &str) -> bool {
    STOP_SET.contains(lower)
}

/// Length in [3,20] chars, not all digits, at least one vowel.
pub fn is_valid_word(lower: &str) -> bool {
    let len = lower.chars().count();
    if !(3..=20).contains(&len) {
        return false;
    }
    if lower.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    lower.chars().any(|c| VOWELS.contains(c))
}

/// Valid and not a stop-word.
pub fn is_content_word(lower: &str) -> bool {
    is_valid_word(lower) && !is_stop_word(lower)
}

/// A word of a headline, punctuation stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleToken {
    pub lower: String,
    /// First char is uppercase in the original text.
    pub capitalized: bool,
    /// 0-based position among the non-empty words of the title.
    pub position: usize,
}

pub fn tokenize_title(title: &str) -> Vec<TitleToken> {
    title
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .enumerate()
        .map(|(position, w)| TitleToken {
            lower: w.to_lowercase(),
            capitalized: w.chars().next().is_some_and(char::is_uppercase),
            position,
        })
        .collect()
}

/// Distinct content words of ≥4 chars, in first-seen order.
/// This is what profiles and the scorer call an item's keywords.
pub fn keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize_title(text)
        .into_iter()
        .filter(|t| t.lower.chars().count() >= 4 && is_content_word(&t.lower))
        .filter_map(|t| seen.insert(t.lower.clone()).then_some(t.lower))
        .collect()
}
