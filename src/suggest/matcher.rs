//! Inline suggestion matching
//!
//! Given the live query and the ordered candidates, pick the single chip to
//! offer as an autocomplete hint:
//!
//! 1. An empty query never matches.
//! 2. Candidates are scanned in order and the first one with a token that
//!    starts with the query (case-insensitive) wins.
//! 3. Of the winner's matching tokens the longest becomes the highlight text;
//!    on equal length the earlier token is kept.
//!
//! The result depends only on its inputs.

use super::Suggestion;
use crate::tokenizer::{Tokenizer, tokens_of};

/// Compute the inline suggestion for `query` over `candidates`
pub fn compute_inline_suggestion<T: Clone>(
    query: &str,
    candidates: &[T],
    tokenizer: &dyn Tokenizer<T>,
) -> Suggestion<T> {
    let query = query.to_lowercase();
    if query.is_empty() {
        return Suggestion::Empty;
    }

    candidates
        .iter()
        .find_map(|item| {
            longest_matching_token(&query, tokens_of(tokenizer, item))
                .map(|highlight| Suggestion::matched(item.clone(), highlight))
        })
        .unwrap_or_default()
}

/// Whether `highlight` is a valid highlight for `query`
pub(crate) fn highlight_matches(query: &str, highlight: &str) -> bool {
    let query = query.to_lowercase();
    !query.is_empty() && highlight.to_lowercase().starts_with(&query)
}

fn longest_matching_token(lowered_query: &str, tokens: Vec<String>) -> Option<String> {
    tokens
        .into_iter()
        .filter(|token| token.to_lowercase().starts_with(lowered_query))
        .fold(None, |best, token| match best {
            Some(best) if char_len(&best) >= char_len(&token) => Some(best),
            _ => Some(token),
        })
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
