//! The stemmer (spec §4.1): a pure, synchronous normalization step with no
//! I/O. Splits a phrase on non-alphanumeric boundaries, lowercases,
//! drops stopwords, and reduces each remaining token to its Snowball
//! English stem. Output order is unspecified - callers treat the result
//! as a set.

use std::collections::HashSet;

use rust_stemmers::{Algorithm, Stemmer};

use crate::error::{AppError, AppResult};

/// Inputs longer than this are rejected outright rather than stemmed -
/// stemming an unbounded phrase is a resource-exhaustion vector.
pub const MAX_INPUT_LEN: usize = 20_000;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "he", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with",
    "this", "these", "those", "i", "you", "we", "they", "them", "his", "her", "their", "not",
    "no", "do", "does", "did", "have", "had", "if", "so", "than", "then", "there",
];

/// Normalize a phrase into a set of stemmed keywords.
///
/// Returns `AppError::BadArguments` if `phrase` exceeds `MAX_INPUT_LEN`.
/// An empty or all-stopword phrase yields an empty set - callers treat
/// that as "no keywords matched" rather than an error.
pub fn normalize(phrase: &str) -> AppResult<HashSet<String>> {
    if phrase.len() > MAX_INPUT_LEN {
        return Err(AppError::BadArguments(format!(
            "phrase exceeds maximum length of {MAX_INPUT_LEN} bytes"
        )));
    }

    let stemmer = Stemmer::create(Algorithm::English);
    let stopwords: HashSet<&str> = STOPWORDS.iter().copied().collect();

    let keywords = phrase
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .filter(|token| !stopwords.contains(token.as_str()))
        .map(|token| stemmer.stem(&token).into_owned())
        .collect();

    Ok(keywords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases() {
        let keywords = normalize("Running Runners RUN").unwrap();
        assert!(keywords.contains("run"));
    }

    #[test]
    fn drops_stopwords() {
        let keywords = normalize("the a an of").unwrap();
        assert!(keywords.is_empty());
    }

    #[test]
    fn splits_on_punctuation() {
        let keywords = normalize("binary-christmas,tree!").unwrap();
        assert!(keywords.contains("binari"));
        assert!(keywords.contains("christma"));
        assert!(keywords.contains("tree"));
    }

    #[test]
    fn rejects_oversized_input() {
        let phrase = "a".repeat(MAX_INPUT_LEN + 1);
        let result = normalize(&phrase);
        assert!(matches!(result, Err(AppError::BadArguments(_))));
    }

    #[test]
    fn empty_phrase_yields_empty_set() {
        let keywords = normalize("").unwrap();
        assert!(keywords.is_empty());
    }
}
