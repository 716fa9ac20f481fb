//! Testing utilities for chipfield
//!
//! Provides scripted collaborators for unit tests:
//! - `MockSource` - a suggestion source over a fixed candidate list
//! - `RecordingHost` - an overlay host that records insert/remove calls
//!
//! Only available when compiled with `cfg(test)`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::overlay::{OverlayHost, SurfaceId};
use crate::suggest::{FetchError, SuggestionBatch, SuggestionSource};

/// Suggestion source returning every candidate that starts with the query
///
/// Every call is recorded. The source can be switched into a failing mode,
/// carry a best-match hint, or be held until a test releases it.
#[derive(Debug, Default)]
pub struct MockSource {
    candidates: Vec<String>,
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
    best_match: Mutex<Option<(String, String)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockSource {
    /// Create a source over `candidates`, in priority order
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Queries this source was called with, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Make subsequent fetches fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Attach a best-match hint to every batch
    pub fn set_best_match(&self, hint: Option<(&str, &str)>) {
        *self.best_match.lock() = hint.map(|(item, highlight)| (item.to_string(), highlight.to_string()));
    }

    /// Hold every fetch until the returned handle is notified
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl SuggestionSource<String> for MockSource {
    async fn fetch(&self, query: &str) -> Result<SuggestionBatch<String>, FetchError> {
        self.calls.lock().push(query.to_string());

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::new(format!("mock fetch failed for '{query}'")));
        }

        let query = query.to_lowercase();
        let items = self
            .candidates
            .iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&query))
            .cloned()
            .collect();
        let batch = SuggestionBatch::new(items);
        Ok(match self.best_match.lock().clone() {
            Some((item, highlight)) => batch.with_best_match(item, highlight),
            None => batch,
        })
    }
}

/// Overlay host call recorded by `RecordingHost`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Inserted(SurfaceId),
    Removed(SurfaceId),
}

/// Overlay host that records every call
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }
}

impl OverlayHost for RecordingHost {
    fn insert(&self, surface: SurfaceId) {
        self.events.lock().push(HostEvent::Inserted(surface));
    }

    fn remove(&self, surface: SurfaceId) {
        self.events.lock().push(HostEvent::Removed(surface));
    }
}
