//! Text Normalizer: turns raw resume / JD text into a space-joined string of
//! stemmed, stopword-filtered tokens.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::stemmer::stem;
use crate::matching::stopwords::is_normalizer_stopword;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z0-9]+\b").unwrap());

/// Lowercases, collapses whitespace, tokenizes, drops stopwords and stems.
///
/// An empty result means the text carried no scorable tokens.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE_RE.replace_all(&lowered, " ");

    TOKEN_RE
        .find_iter(&collapsed)
        .map(|m| m.as_str())
        .filter(|token| !is_normalizer_stopword(token))
        .map(stem)
        .collect::<Vec<_>>()
        .join(" ")
}
