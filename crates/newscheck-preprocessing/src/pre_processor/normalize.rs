use std::sync::LazyLock;

use ahash::HashSet;
use stop_words::{LANGUAGE, get};

/// Tokens shorter than this (in chars) are dropped during normalization.
pub const MIN_TOKEN_CHARS: usize = 2;

static STOPWORDS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    get(LANGUAGE::English)
        .iter()
        .map(|word| word.to_lowercase())
        .collect()
});

/// Check whether a lowercase token is an English stopword.
#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

/// Normalize raw text into the whitespace-separated form the vectorizer consumes.
///
/// The text is lowercased, every non-alphabetic character acts as a separator,
/// and stopwords plus tokens shorter than [`MIN_TOKEN_CHARS`] are removed.
/// Training and inference must both go through this function.
///
/// ```
/// use newscheck_preprocessing::preprocess_text;
///
/// assert_eq!(
///     preprocess_text("  The Senator, ELECTION fraud!! 2024 "),
///     "senator election fraud"
/// );
/// ```
#[must_use]
pub fn preprocess_text(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS && !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}
