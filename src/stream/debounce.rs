//! Transforms applied to raw input before it becomes a stream's current value
//!
//! Raw input is delivered to a background task that owns the transform. The
//! transform decides when a value is ready by handing back a deadline; when
//! the deadline passes without newer input, [`InputTransform::finish`] yields
//! the value to publish.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Stateful transform between a raw input channel and a stream's current value
pub trait InputTransform<V>: Send + 'static {
    /// Called whenever a raw value arrives.
    ///
    /// Returns the deadline at which [`finish`](Self::finish) should run, or
    /// `None` to wait for more input. `deadline` is the currently armed one.
    fn handle_input(&mut self, value: V, deadline: Option<Instant>) -> Option<Instant>;

    /// Called when the deadline is reached; returns the value to publish
    fn finish(&mut self) -> Option<V>;

    /// Discard any pending value
    fn cancel(&mut self);
}

/// Trailing-edge debounce: only the last value of a quiet window survives
#[derive(Debug)]
pub struct Debounce<V> {
    window: Duration,
    pending: Option<V>,
}

impl<V> Debounce<V> {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl<V: Send + 'static> InputTransform<V> for Debounce<V> {
    fn handle_input(&mut self, value: V, _deadline: Option<Instant>) -> Option<Instant> {
        self.pending = Some(value);
        // every keystroke restarts the window
        Some(Instant::now() + self.window)
    }

    fn finish(&mut self) -> Option<V> {
        self.pending.take()
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Pass-through transform that publishes every value on the next tick
#[derive(Debug)]
pub struct Immediate<V> {
    pending: Option<V>,
}

impl<V> Default for Immediate<V> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<V: Send + 'static> InputTransform<V> for Immediate<V> {
    fn handle_input(&mut self, value: V, _deadline: Option<Instant>) -> Option<Instant> {
        self.pending = Some(value);
        Some(Instant::now())
    }

    fn finish(&mut self) -> Option<V> {
        self.pending.take()
    }

    fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Latest-value mailbox between a stream and its input task
///
/// Holds at most one raw value; a newer value replaces one the task has not
/// picked up yet, so the slot can never fill up. Every cancellation bumps the
/// epoch. A value taken under an older epoch is never published.
pub(crate) struct InputSlot<V> {
    state: Mutex<SlotState<V>>,
    wake: Notify,
}

struct SlotState<V> {
    pending: Option<V>,
    epoch: u64,
    closed: bool,
}

impl<V> InputSlot<V> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                pending: None,
                epoch: 0,
                closed: false,
            }),
            wake: Notify::new(),
        }
    }

    /// Store `value`, replacing any value not yet taken
    ///
    /// Returns `false` once the slot is closed.
    pub(crate) fn put(&self, value: V) -> bool {
        let mut state = self.state.lock();
        if state.closed {
            return false;
        }
        state.pending = Some(value);
        drop(state);
        self.wake.notify_one();
        true
    }

    /// Invalidate pending and in-flight input, then run `write` before any
    /// input task can publish again
    pub(crate) fn cancel_then<R>(&self, write: impl FnOnce() -> R) -> R {
        let mut state = self.state.lock();
        state.pending = None;
        state.epoch += 1;
        let result = write();
        drop(state);
        self.wake.notify_one();
        result
    }

    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.wake.notify_one();
    }

    fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Current epoch and pending value, or `None` once closed
    fn take(&self) -> Option<(u64, Option<V>)> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        Some((state.epoch, state.pending.take()))
    }

    /// Run `publish` if no cancellation happened since `epoch`
    ///
    /// A superseded value is dropped and counts as success.
    fn commit(&self, epoch: u64, publish: impl FnOnce() -> bool) -> bool {
        let state = self.state.lock();
        if state.closed {
            return false;
        }
        if state.epoch != epoch {
            return true;
        }
        publish()
    }
}

/// Drive `transform` until the slot is closed
///
/// `publish` returns `false` once the target stream is gone, which ends the
/// task early.
pub(crate) async fn run<V, X, P>(mut transform: X, slot: Arc<InputSlot<V>>, mut publish: P)
where
    X: InputTransform<V>,
    P: FnMut(V) -> bool,
{
    let mut deadline = None;
    let mut epoch = slot.epoch();
    loop {
        let woken = match deadline {
            Some(at) => tokio::time::timeout_at(at, slot.wake.notified())
                .await
                .is_ok(),
            None => {
                slot.wake.notified().await;
                true
            }
        };

        if !woken {
            deadline = None;
            if let Some(value) = transform.finish() {
                if !slot.commit(epoch, || publish(value)) {
                    break;
                }
            }
            continue;
        }

        let Some((current, value)) = slot.take() else {
            break;
        };
        if current != epoch {
            transform.cancel();
            deadline = None;
            epoch = current;
        }
        if let Some(value) = value {
            deadline = transform.handle_input(value, deadline);
        }
    }
}
