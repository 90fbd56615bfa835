use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is neither a word character nor whitespace, plus underscore.
static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]|_").expect("invalid non-word regex"));

/// Canonicalize a text fragment for comparison: trim, strip punctuation,
/// lowercase. Two inputs differing only by case, punctuation, or surrounding
/// whitespace normalize identically.
pub fn normalize(text: &str) -> String {
    NON_WORD_RE.replace_all(text.trim(), "").to_lowercase()
}

/// Normalized words of a fragment, in order. Empty for blank or
/// punctuation-only input.
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// First normalized word, or the empty string if there are none.
pub fn first_word(text: &str) -> String {
    words(text).into_iter().next().unwrap_or_default()
}

/// Last normalized word, or the empty string if there are none.
pub fn last_word(text: &str) -> String {
    words(text).into_iter().next_back().unwrap_or_default()
}

/// Second-to-last normalized word. `None` when fewer than two words exist;
/// this stays distinguishable from an empty token on purpose, since the
/// boundary tiers only fire when the word is actually present.
pub fn second_last_word(text: &str) -> Option<String> {
    let mut words = words(text);
    if words.len() < 2 {
        return None;
    }
    words.pop();
    words.pop()
}
