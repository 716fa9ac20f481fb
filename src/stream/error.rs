//! Value stream error types

use thiserror::Error;

/// Errors raised by [`ValueStream`](super::ValueStream) writes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The stream was disposed and no longer accepts writes
    #[error("Stream '{0}' has been disposed")]
    Disposed(&'static str),
}
