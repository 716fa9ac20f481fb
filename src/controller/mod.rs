//! Chips controller façade
//!
//! [`ChipsController`] ties the chip list, the suggestion pipeline and the
//! overlay together and is the only thing a UI adapter talks to.
//!
//! # Mutation protocol
//!
//! Every chip change (`add_chip`, `add_chips`, `remove_chip`,
//! `remove_chip_at`, `replace_chips`, `pop_chip`) runs the same sequence:
//!
//! 1. No-op with an empty diff while the controller is disabled.
//! 2. Copy the current chips, apply the change to the copy, and sync the copy
//!    into the [`DiffableList`].
//! 3. If the diff is non-empty, clear query, candidates and inline match
//!    while still holding the list, then fire one change notification.
//!
//! Listeners therefore never observe a suggestion computed against a chip
//! set that no longer exists.
//!
//! # Notifications
//!
//! Every state change fires one change notification: chip mutations, direct
//! query writes, a debounced query landing, published suggestions,
//! placeholder and enablement changes. Listeners are only called while the
//! overlay is [`OverlayStatus::Open`]. Notifications raised while it is not
//! are dropped, not queued.
//!
//! Listeners registered with [`ChipsController::add_listener`] always see
//! query, candidates and inline match as one consistent state. The
//! per-stream subscriptions (`query_changes`, `suggestions_changes`,
//! `suggestion_changes`) are independent: between two writes of one load or
//! reset a subscriber of one stream may observe it paired with the other
//! stream's previous value.
//!
//! # Disposal
//!
//! After [`ChipsController::dispose`] every mutating call returns
//! [`ChipsError::Disposed`]. Accessors keep returning the last state.
//!
//! Overlay hosts and keyboard hooks are called synchronously and must not
//! call back into the controller from inside those callbacks.

pub mod builder;
mod hooks;

use std::fmt;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

pub use builder::ChipsControllerBuilder;
pub use hooks::{KeyboardHooks, ListenerId, NoKeyboard};

use crate::list::{DiffOp, DiffableList, Equivalence};
use crate::overlay::{OpenResult, OverlayHost, OverlayState, OverlayStatus, SurfaceId};
use crate::stream::{Debounce, Subscription, ValueStream};
use crate::suggest::{LoadOutcome, Suggestion, SuggestionEngine, SuggestionSource};
use crate::{ChipsError, Result};
use hooks::Notifier;

struct Inner<T> {
    chips: Mutex<DiffableList<T>>,
    engine: SuggestionEngine<T>,
    placeholder: ValueStream<String>,
    overlay: Mutex<OverlayState>,
    notifier: Notifier,
    keyboard: Mutex<Arc<dyn KeyboardHooks>>,
    enabled: AtomicBool,
    disposed: AtomicBool,
    /// Query version last written by the controller itself
    direct_query: AtomicU64,
    query_watch: Mutex<Option<JoinHandle<()>>>,
}

/// Controller behind a chips input field
///
/// Cloning yields another handle to the same controller.
pub struct ChipsController<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ChipsController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> ChipsController<T>
where
    T: Clone + Display + PartialEq + Send + Sync + 'static,
{
    /// Create a new builder with `Display` tokenization and `PartialEq` identity
    #[must_use]
    pub fn builder() -> ChipsControllerBuilder<T> {
        ChipsControllerBuilder::new()
    }
}

impl<T> ChipsController<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from_parts(source: Arc<dyn SuggestionSource<T>>, builder: ChipsControllerBuilder<T>) -> Self {
        let ChipsControllerBuilder {
            tokenizer,
            equivalence,
            keyboard,
            config,
            chips,
            ..
        } = builder;

        let mut list = DiffableList::new(Arc::clone(&equivalence));
        list.sync(chips);

        let engine = SuggestionEngine::new(source, tokenizer, equivalence);
        engine
            .query()
            .attach_input(Debounce::new(config.debounce()));

        let controller = Self {
            inner: Arc::new(Inner {
                chips: Mutex::new(list),
                engine,
                placeholder: ValueStream::new("placeholder", config.placeholder.clone()),
                overlay: Mutex::new(OverlayState::new(config.hide_suggestion_overlay)),
                notifier: Notifier::default(),
                keyboard: Mutex::new(keyboard),
                enabled: AtomicBool::new(config.enabled),
                disposed: AtomicBool::new(false),
                direct_query: AtomicU64::new(0),
                query_watch: Mutex::new(None),
            }),
        };
        controller.spawn_query_watch(config.auto_load);
        controller
    }

    /// Follow query changes: notify when debounced input lands and, with
    /// `auto_load`, load suggestions for every new query
    fn spawn_query_watch(&self, auto_load: bool) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("no tokio runtime, suggestions load only on request");
            return;
        }
        let mut changes = self.inner.engine.query().subscribe();
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(snapshot) = changes.changed().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let controller = ChipsController { inner };
                if controller.is_disposed() {
                    break;
                }
                // direct writes already notified
                if snapshot.version != controller.inner.direct_query.load(Ordering::Acquire) {
                    controller.notify();
                }
                if auto_load {
                    if let Err(error) = controller.load_suggestions().await {
                        warn!("background suggestion load failed: {error}");
                    }
                }
            }
        });
        *self.inner.query_watch.lock() = Some(task);
    }

    fn mark_direct_query(&self, version: u64) {
        self.inner.direct_query.store(version, Ordering::Release);
    }

    // ---------------------------------------------------------------------
    // State accessors
    // ---------------------------------------------------------------------

    /// Current chips in order
    #[must_use]
    pub fn chips(&self) -> Vec<T> {
        self.inner.chips.lock().snapshot()
    }

    #[must_use]
    pub fn chip_count(&self) -> usize {
        self.inner.chips.lock().len()
    }

    /// The live query text
    #[must_use]
    pub fn query(&self) -> String {
        self.inner.engine.query().current()
    }

    /// The inline suggestion (never absent; may be `Suggestion::Empty`)
    #[must_use]
    pub fn suggestion(&self) -> Suggestion<T> {
        self.inner.engine.suggestion().current()
    }

    /// Candidates from the last successful load, minus current chips
    #[must_use]
    pub fn suggestions(&self) -> Vec<T> {
        self.inner.engine.suggestions().current()
    }

    #[must_use]
    pub fn placeholder(&self) -> String {
        self.inner.placeholder.current()
    }

    /// The placeholder, but only while there are no chips
    #[must_use]
    pub fn visible_placeholder(&self) -> Option<String> {
        if self.inner.chips.lock().is_empty() {
            Some(self.placeholder())
        } else {
            None
        }
    }

    #[must_use]
    pub fn overlay_status(&self) -> OverlayStatus {
        self.inner.overlay.lock().status()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn query_changes(&self) -> Subscription<String> {
        self.inner.engine.query().subscribe()
    }

    #[must_use]
    pub fn suggestion_changes(&self) -> Subscription<Suggestion<T>> {
        self.inner.engine.suggestion().subscribe()
    }

    #[must_use]
    pub fn suggestions_changes(&self) -> Subscription<Vec<T>> {
        self.inner.engine.suggestions().subscribe()
    }

    #[must_use]
    pub fn placeholder_changes(&self) -> Subscription<String> {
        self.inner.placeholder.subscribe()
    }

    // ---------------------------------------------------------------------
    // Chip mutations
    // ---------------------------------------------------------------------

    /// Append `item`
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn add_chip(&self, item: T) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, _| {
            chips.push(item);
            Ok(())
        })
    }

    /// Append all `items` in order
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn add_chips(&self, items: Vec<T>) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, _| {
            chips.extend(items);
            Ok(())
        })
    }

    /// Remove the first chip equivalent to `item`; no-op if there is none
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn remove_chip(&self, item: &T) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, eq| {
            if let Some(index) = chips.iter().position(|chip| eq.equivalent(chip, item)) {
                chips.remove(index);
            }
            Ok(())
        })
    }

    /// Remove the chip at `index`
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::IndexOutOfRange` for a bad index, or
    /// `ChipsError::Disposed` after disposal.
    pub fn remove_chip_at(&self, index: usize) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, _| {
            if index >= chips.len() {
                return Err(ChipsError::IndexOutOfRange {
                    index,
                    len: chips.len(),
                });
            }
            chips.remove(index);
            Ok(())
        })
    }

    /// Replace all chips with `items`
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn replace_chips(&self, items: Vec<T>) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, _| {
            *chips = items;
            Ok(())
        })
    }

    /// Remove the last chip (backspace on an empty query)
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn pop_chip(&self) -> Result<Vec<DiffOp<T>>> {
        self.apply_mutation(|chips, _| {
            chips.pop();
            Ok(())
        })
    }

    /// Turn a suggestion into a chip
    ///
    /// Uses `explicit` if given, otherwise the current inline suggestion.
    /// The inline suggestion is cleared before the chip is added, so the
    /// add's own reset cannot bring it back.
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn accept_suggestion(&self, explicit: Option<T>) -> Result<Vec<DiffOp<T>>> {
        self.ensure_active()?;
        if !self.is_enabled() {
            return Ok(Vec::new());
        }
        let Some(item) = explicit.or_else(|| self.suggestion().into_item()) else {
            return Ok(Vec::new());
        };

        self.inner.engine.clear_suggestion()?;
        let ops = self.add_chip(item)?;
        if ops.is_empty() {
            let version = self.inner.engine.query().set(String::new())?;
            self.mark_direct_query(version);
        }
        Ok(ops)
    }

    fn apply_mutation<F>(&self, mutate: F) -> Result<Vec<DiffOp<T>>>
    where
        F: FnOnce(&mut Vec<T>, &dyn Equivalence<T>) -> Result<()>,
    {
        self.ensure_active()?;
        if !self.is_enabled() {
            trace!("controller disabled, ignoring chip mutation");
            return Ok(Vec::new());
        }

        let ops = {
            let mut list = self.inner.chips.lock();
            let equivalence = Arc::clone(list.equivalence());
            let mut next = list.snapshot();
            mutate(&mut next, equivalence.as_ref())?;
            let ops = list.sync(next);
            if !ops.is_empty() {
                self.inner.engine.reset()?;
                self.mark_direct_query(self.inner.engine.query().version());
            }
            ops
        };

        if !ops.is_empty() {
            debug!(operations = ops.len(), "chips changed");
            self.notify();
        }
        Ok(ops)
    }

    // ---------------------------------------------------------------------
    // Query and suggestions
    // ---------------------------------------------------------------------

    /// Set the query immediately, bypassing the debounce
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn set_query(&self, text: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        let version = self.inner.engine.query().set(text.into())?;
        self.mark_direct_query(version);
        self.notify();
        Ok(())
    }

    /// Feed raw text from the input field; it becomes the query once typing
    /// pauses for the debounce window
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn push_query_input(&self, text: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        self.inner.engine.query().push_input(text.into())?;
        Ok(())
    }

    /// Fetch suggestions for the live query and publish them
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Fetch` when the source fails (published state is
    /// left untouched), or `ChipsError::Disposed` after disposal.
    pub async fn load_suggestions(&self) -> Result<LoadOutcome> {
        self.ensure_active()?;
        let inner = &self.inner;
        let outcome = inner
            .engine
            .load(|| inner.chips.lock().snapshot())
            .await
            .map_err(|error| match error {
                ChipsError::Stream(_) if self.is_disposed() => ChipsError::Disposed,
                other => other,
            })?;

        if outcome == LoadOutcome::Published && !self.is_disposed() {
            self.notify();
        }
        Ok(outcome)
    }

    // ---------------------------------------------------------------------
    // Placeholder, enablement, keyboard
    // ---------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn set_placeholder(&self, text: impl Into<String>) -> Result<()> {
        self.ensure_active()?;
        self.inner.placeholder.set(text.into())?;
        self.notify();
        Ok(())
    }

    /// Enable or disable chip mutations; notifies only on an actual change
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.ensure_active()?;
        if self.inner.enabled.swap(enabled, Ordering::AcqRel) != enabled {
            self.notify();
        }
        Ok(())
    }

    pub fn set_keyboard_hooks(&self, hooks: Arc<dyn KeyboardHooks>) {
        *self.inner.keyboard.lock() = hooks;
    }

    pub fn request_keyboard(&self) {
        let hooks = self.inner.keyboard.lock().clone();
        hooks.request_keyboard();
    }

    pub fn hide_keyboard(&self) {
        let hooks = self.inner.keyboard.lock().clone();
        hooks.hide_keyboard();
    }

    // ---------------------------------------------------------------------
    // Overlay
    // ---------------------------------------------------------------------

    /// Hand the overlay its render surface
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn initialize_overlay(
        &self,
        host: Arc<dyn OverlayHost>,
        surface: SurfaceId,
    ) -> Result<OverlayStatus> {
        self.ensure_active()?;
        Ok(self.inner.overlay.lock().initialize(host, surface))
    }

    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn open_overlay(&self) -> Result<OpenResult> {
        self.ensure_active()?;
        Ok(self.inner.overlay.lock().open())
    }

    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn close_overlay(&self) -> Result<bool> {
        self.ensure_active()?;
        Ok(self.inner.overlay.lock().close())
    }

    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn toggle_overlay(&self) -> Result<OverlayStatus> {
        self.ensure_active()?;
        Ok(self.inner.overlay.lock().toggle())
    }

    /// Release the render surface (the host is going away)
    ///
    /// # Errors
    ///
    /// Returns `ChipsError::Disposed` after disposal.
    pub fn detach_overlay(&self) -> Result<OverlayStatus> {
        self.ensure_active()?;
        Ok(self.inner.overlay.lock().detach())
    }

    // ---------------------------------------------------------------------
    // Listeners and lifecycle
    // ---------------------------------------------------------------------

    /// Register a payload-free change listener
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.notifier.add(Arc::new(listener))
    }

    /// Unregister a listener; returns whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.notifier.remove(id)
    }

    /// Tear down streams, overlay and listeners
    ///
    /// Idempotent. Callers must not issue further operations.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(task) = self.inner.query_watch.lock().take() {
            task.abort();
        }
        self.inner.overlay.lock().teardown();
        self.inner.engine.dispose();
        self.inner.placeholder.dispose();
        self.inner.notifier.clear();
        debug!("chips controller disposed");
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_disposed() {
            Err(ChipsError::Disposed)
        } else {
            Ok(())
        }
    }

    fn notify(&self) {
        debug_assert!(!self.is_disposed(), "change notification after dispose");
        if !self.inner.overlay.lock().is_open() {
            trace!("overlay not open, change notification suppressed");
            return;
        }
        self.inner.notifier.notify();
    }
}

impl<T: fmt::Debug> fmt::Debug for ChipsController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChipsController")
            .field("chips", &self.inner.chips.lock().items())
            .field("overlay", &*self.inner.overlay.lock())
            .field("notifier", &self.inner.notifier)
            .field("disposed", &self.inner.disposed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
