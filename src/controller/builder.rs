//! Builder for `ChipsController`
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use chipfield::{ChipsController, ChipsConfig, SuggestionSource};
//! # fn example(source: Arc<dyn SuggestionSource<String>>) -> chipfield::Result<()> {
//! let controller: ChipsController<String> = ChipsController::builder()
//!     .source(source)
//!     .config(ChipsConfig::default())
//!     .chips(vec!["rust".to_string()])
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::sync::Arc;

use super::{ChipsController, KeyboardHooks, NoKeyboard};
use crate::ChipsError;
use crate::config::ChipsConfig;
use crate::list::{Equivalence, ValueEquality};
use crate::suggest::SuggestionSource;
use crate::tokenizer::{DisplayTokenizer, Tokenizer};

/// Builder for [`ChipsController`]
pub struct ChipsControllerBuilder<T> {
    pub(super) source: Option<Arc<dyn SuggestionSource<T>>>,
    pub(super) tokenizer: Arc<dyn Tokenizer<T>>,
    pub(super) equivalence: Arc<dyn Equivalence<T>>,
    pub(super) keyboard: Arc<dyn KeyboardHooks>,
    pub(super) config: ChipsConfig,
    pub(super) chips: Vec<T>,
}

impl<T> ChipsControllerBuilder<T>
where
    T: Clone + Display + PartialEq + Send + Sync + 'static,
{
    /// Builder using `Display` tokenization and `PartialEq` identity
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(DisplayTokenizer), Arc::new(ValueEquality))
    }
}

impl<T> Default for ChipsControllerBuilder<T>
where
    T: Clone + Display + PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ChipsControllerBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Builder for item types without `Display`/`PartialEq`
    #[must_use]
    pub fn with_collaborators(
        tokenizer: Arc<dyn Tokenizer<T>>,
        equivalence: Arc<dyn Equivalence<T>>,
    ) -> Self {
        Self {
            source: None,
            tokenizer,
            equivalence,
            keyboard: Arc::new(NoKeyboard),
            config: ChipsConfig::default(),
            chips: Vec::new(),
        }
    }

    /// Set the suggestion source (required)
    #[must_use]
    pub fn source(mut self, source: Arc<dyn SuggestionSource<T>>) -> Self {
        self.source = Some(source);
        self
    }

    /// Override the tokenizer
    #[must_use]
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer<T>>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Override the identity predicate
    #[must_use]
    pub fn equivalence(mut self, equivalence: Arc<dyn Equivalence<T>>) -> Self {
        self.equivalence = equivalence;
        self
    }

    /// Register keyboard hooks
    #[must_use]
    pub fn keyboard_hooks(mut self, hooks: Arc<dyn KeyboardHooks>) -> Self {
        self.keyboard = hooks;
        self
    }

    /// Set configuration
    #[must_use]
    pub fn config(mut self, config: ChipsConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial chips
    #[must_use]
    pub fn chips(mut self, chips: Vec<T>) -> Self {
        self.chips = chips;
        self
    }

    /// Build the controller
    ///
    /// Inside a tokio runtime this also starts the debounced query pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Build` if no suggestion source was provided.
    pub fn build(mut self) -> Result<ChipsController<T>, ChipsError> {
        let source = self
            .source
            .take()
            .ok_or_else(|| ChipsError::Build("Suggestion source is required".to_string()))?;
        Ok(ChipsController::from_parts(source, self))
    }
}
