//! Fetch → filter → match → publish pipeline
//!
//! Each load takes a ticket from a monotonically increasing generation
//! counter before calling the source. When the fetch resolves, the result is
//! only published if no newer load or reset happened in the meantime and the
//! live query still equals the query that was fetched. Otherwise the result
//! is dropped and [`LoadOutcome::Superseded`] is returned.
//!
//! The query, candidate and inline-match streams are written one after
//! another. Code that needs all three consistent should read them after
//! `load` or `reset` returns rather than from a single stream's subscription.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::matcher::{compute_inline_suggestion, highlight_matches};
use super::{Suggestion, SuggestionSource};
use crate::ChipsError;
use crate::list::Equivalence;
use crate::stream::ValueStream;
use crate::tokenizer::Tokenizer;

/// What happened to a completed load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Suggestions were published
    Published,
    /// A newer query or reset overtook this load; nothing was published
    Superseded,
}

/// Owns the query and suggestion streams and keeps them consistent
pub struct SuggestionEngine<T> {
    source: Arc<dyn SuggestionSource<T>>,
    tokenizer: Arc<dyn Tokenizer<T>>,
    equivalence: Arc<dyn Equivalence<T>>,
    query: ValueStream<String>,
    suggestions: ValueStream<Vec<T>>,
    suggestion: ValueStream<Suggestion<T>>,
    generation: AtomicU64,
}

impl<T> SuggestionEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(
        source: Arc<dyn SuggestionSource<T>>,
        tokenizer: Arc<dyn Tokenizer<T>>,
        equivalence: Arc<dyn Equivalence<T>>,
    ) -> Self {
        Self {
            source,
            tokenizer,
            equivalence,
            query: ValueStream::new("query", String::new()),
            suggestions: ValueStream::new("suggestions", Vec::new()),
            suggestion: ValueStream::new("suggestion", Suggestion::Empty),
            generation: AtomicU64::new(0),
        }
    }

    pub const fn query(&self) -> &ValueStream<String> {
        &self.query
    }

    pub const fn suggestions(&self) -> &ValueStream<Vec<T>> {
        &self.suggestions
    }

    pub const fn suggestion(&self) -> &ValueStream<Suggestion<T>> {
        &self.suggestion
    }

    /// Fetch suggestions for the live query and publish them
    ///
    /// `chips` is read after the fetch resolves; candidates equivalent to any
    /// returned chip are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Fetch` if the source fails, leaving the published
    /// state untouched, or `ChipsError::Stream` if the streams were disposed.
    pub async fn load<F>(&self, chips: F) -> Result<LoadOutcome, ChipsError>
    where
        F: FnOnce() -> Vec<T>,
    {
        let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let query = self.query.current();

        let batch = self.source.fetch(&query).await?;

        if self.generation.load(Ordering::Acquire) != ticket || self.query.current() != query {
            debug!(query = %query, ticket, "discarding superseded suggestions");
            return Ok(LoadOutcome::Superseded);
        }

        let chips = chips();
        let (items, best_match) = batch.into_parts();
        let candidates: Vec<T> = items
            .into_iter()
            .filter(|item| !self.is_chip(&chips, item))
            .collect();

        let inline = match best_match {
            Some((item, highlight))
                if highlight_matches(&query, &highlight) && !self.is_chip(&chips, &item) =>
            {
                Suggestion::matched(item, highlight)
            }
            _ => compute_inline_suggestion(&query, &candidates, self.tokenizer.as_ref()),
        };

        debug!(
            query = %query,
            candidates = candidates.len(),
            inline = !inline.is_empty(),
            "publishing suggestions"
        );
        self.suggestions.set(candidates)?;
        self.suggestion.set(inline)?;
        Ok(LoadOutcome::Published)
    }

    /// Clear query, candidates and inline match; in-flight loads go stale
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Stream` if the streams were disposed.
    pub fn reset(&self) -> Result<(), ChipsError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.query.set(String::new())?;
        self.suggestions.set(Vec::new())?;
        self.suggestion.set(Suggestion::Empty)?;
        Ok(())
    }

    /// Drop only the inline match
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Stream` if the streams were disposed.
    pub fn clear_suggestion(&self) -> Result<(), ChipsError> {
        self.suggestion.set(Suggestion::Empty)?;
        Ok(())
    }

    /// Close every stream owned by the engine
    pub fn dispose(&self) {
        self.query.dispose();
        self.suggestions.dispose();
        self.suggestion.dispose();
    }

    fn is_chip(&self, chips: &[T], item: &T) -> bool {
        chips
            .iter()
            .any(|chip| self.equivalence.equivalent(chip, item))
    }
}
