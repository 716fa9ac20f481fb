//! Suggestion fetch errors
//!
//! A [`FetchError`] is produced by a [`SuggestionSource`](super::SuggestionSource)
//! implementation and handed unchanged to whoever called
//! `load_suggestions`. The suggestion state is never touched when a fetch
//! fails.

use std::error::Error as StdError;

use thiserror::Error;

/// The suggestion-fetch collaborator failed
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl FetchError {
    /// Create an error with just a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping the underlying cause
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
