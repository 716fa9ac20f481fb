//! Suggestion lookup and inline autocomplete
//!
//! - [`SuggestionSource`] - the external fetch collaborator
//! - [`SuggestionBatch`] - what a fetch returns
//! - [`Suggestion`] - the single inline match (or the empty sentinel)
//! - [`SuggestionEngine`] - fetch → filter → match → publish pipeline

pub mod engine;
mod error;
pub mod matcher;

use async_trait::async_trait;

pub use engine::{LoadOutcome, SuggestionEngine};
pub use error::FetchError;
pub use matcher::compute_inline_suggestion;

/// The inline suggestion
///
/// There is always exactly one current suggestion; "no suggestion" is the
/// [`Suggestion::Empty`] sentinel rather than an absent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion<T> {
    /// No inline suggestion
    Empty,
    /// `item` matched; `highlight` is the token that prefix-matched the query
    Match { item: T, highlight: String },
}

impl<T> Suggestion<T> {
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    #[must_use]
    pub const fn matched(item: T, highlight: String) -> Self {
        Self::Match { item, highlight }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub const fn item(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Match { item, .. } => Some(item),
        }
    }

    #[must_use]
    pub fn highlight_text(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Match { highlight, .. } => Some(highlight),
        }
    }

    #[must_use]
    pub fn into_item(self) -> Option<T> {
        match self {
            Self::Empty => None,
            Self::Match { item, .. } => Some(item),
        }
    }
}

impl<T> Default for Suggestion<T> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Candidates returned by one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionBatch<T> {
    items: Vec<T>,
    best_match: Option<(T, String)>,
}

impl<T> SuggestionBatch<T> {
    /// A batch of candidates in priority order
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self {
            items,
            best_match: None,
        }
    }

    /// A batch with no candidates
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Hint the inline suggestion instead of letting the engine compute it
    ///
    /// The hint is ignored unless `highlight` prefix-matches the query and the
    /// item is not already a chip.
    #[must_use]
    pub fn with_best_match(mut self, item: T, highlight: impl Into<String>) -> Self {
        self.best_match = Some((item, highlight.into()));
        self
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub const fn best_match(&self) -> Option<&(T, String)> {
        self.best_match.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<T>, Option<(T, String)>) {
        (self.items, self.best_match)
    }
}

impl<T> From<Vec<T>> for SuggestionBatch<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

/// External suggestion lookup
///
/// Called with the live query (possibly empty). Failures are returned to the
/// caller of `load_suggestions` and leave the published suggestions intact.
#[async_trait]
pub trait SuggestionSource<T>: Send + Sync {
    /// Fetch candidates for `query`
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the lookup fails.
    async fn fetch(&self, query: &str) -> Result<SuggestionBatch<T>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_suggestion_accessors() {
        let suggestion: Suggestion<String> = Suggestion::default();
        assert!(suggestion.is_empty());
        assert_eq!(suggestion.item(), None);
        assert_eq!(suggestion.highlight_text(), None);
        assert_eq!(suggestion.into_item(), None);
    }

    #[test]
    fn test_matched_suggestion_accessors() {
        let suggestion = Suggestion::matched(7u32, "seven".to_string());
        assert!(!suggestion.is_empty());
        assert_eq!(suggestion.item(), Some(&7));
        assert_eq!(suggestion.highlight_text(), Some("seven"));
        assert_eq!(suggestion.into_item(), Some(7));
    }

    #[test]
    fn test_batch_builder() {
        let batch = SuggestionBatch::new(vec!["rust", "ruby"]).with_best_match("ruby", "ruby");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.best_match(), Some(&("ruby", "ruby".to_string())));
        assert!(SuggestionBatch::<u8>::empty().is_empty());
    }
}
