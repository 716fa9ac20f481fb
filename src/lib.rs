//! Chipfield - a headless controller for chip/tag input fields
//!
//! The crate owns everything behind a "chips" input except the drawing:
//! the ordered chip collection and its minimal diffs, the debounced query,
//! asynchronous suggestion lookup with inline completion, and the
//! open/close state of the suggestion overlay. A UI adapter feeds it
//! keystrokes and renders what it publishes.
//!
//! Start with [`ChipsController::builder`].

use thiserror::Error;

pub mod config;
pub mod controller;
pub mod list;
pub mod overlay;
pub mod stream;
pub mod suggest;
pub mod tokenizer;

#[cfg(test)]
pub mod testing;

pub use config::ChipsConfig;
pub use controller::{ChipsController, ChipsControllerBuilder, KeyboardHooks, ListenerId, NoKeyboard};
pub use list::{DiffOp, DiffableList, Equivalence, ValueEquality};
pub use overlay::{OpenResult, OverlayHost, OverlayStatus, SurfaceId};
pub use stream::{StreamError, Subscription, ValueStream};
pub use suggest::{FetchError, LoadOutcome, Suggestion, SuggestionBatch, SuggestionSource};
pub use tokenizer::{DisplayTokenizer, Tokenizer};

/// Error enum, contains all failure states of the controller
#[derive(Debug, Error)]
pub enum ChipsError {
    /// The suggestion source failed
    #[error("Suggestion fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// A value stream rejected a write
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// The controller was disposed
    #[error("Controller has been disposed")]
    Disposed,
    #[error("Chip index {index} out of range for {len} chips")]
    IndexOutOfRange { index: usize, len: usize },
    /// The builder was missing a required part
    #[error("Failed to build controller: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, ChipsError>;
