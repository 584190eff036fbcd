//! Shared lexical normalization for keyword indexing and scoring.

use std::collections::BTreeSet;

pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it", "its", "of", "on",
    "that", "the", "to", "was", "will", "with", "or", "but", "not", "this", "these", "they", "them", "their", "there",
    "then", "than", "so", "if", "when", "where", "why", "how", "what", "which", "who", "whom", "whose", "can", "could",
    "should", "would", "may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

/// Lowercased alphanumeric tokens with stop words removed, in text order.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
}

/// Distinct terms of `text`.
pub fn term_set(text: &str) -> BTreeSet<String> {
    tokens(text).collect()
}

/// Distinct terms of `text` in first-seen order.
pub fn ordered_terms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tokens(text).filter(|t| seen.insert(t.clone())).collect()
}
