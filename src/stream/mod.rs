//! Observable value cells with versioned writes
//!
//! A [`ValueStream`] holds one "current" value. Every write bumps a version
//! and wakes subscribers. Optionally a raw-input slot can be attached: raw
//! values pass through an [`InputTransform`] (usually a [`Debounce`]) running
//! on a background task before they land in `current`.
//!
//! # Supersession
//!
//! A direct [`ValueStream::set`] cancels whatever raw input is still pending
//! in the transform before it publishes, and the input task cannot publish
//! in between. A debounced keystroke therefore never overwrites a newer
//! programmatic write.
//!
//! # Disposal
//!
//! [`ValueStream::dispose`] closes the input channel, ends every
//! subscription and makes all further writes fail with
//! [`StreamError::Disposed`]. Reads keep returning the last value. Disposing
//! twice is a no-op.

pub mod debounce;
mod error;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

pub use debounce::{Debounce, Immediate, InputTransform};
pub use error::StreamError;

use debounce::InputSlot;

/// A value together with the version it was written at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<V> {
    /// Starts at 0 for the initial value, +1 per write
    pub version: u64,
    pub value: V,
}

struct InputChannel<V> {
    slot: Arc<InputSlot<V>>,
    task: JoinHandle<()>,
}

struct Shared<V> {
    name: &'static str,
    tx: Mutex<Option<watch::Sender<Snapshot<V>>>>,
    rx: watch::Receiver<Snapshot<V>>,
    input: Mutex<Option<InputChannel<V>>>,
    update_lock: tokio::sync::Mutex<()>,
    disposed: Arc<AtomicBool>,
}

impl<V> Shared<V> {
    fn publish(&self, value: V) -> Result<u64, StreamError> {
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(StreamError::Disposed(self.name));
        };
        let mut version = 0;
        tx.send_modify(|snapshot| {
            snapshot.version += 1;
            snapshot.value = value;
            version = snapshot.version;
        });
        trace!(stream = self.name, version, "published value");
        Ok(version)
    }

    fn input_slot(&self) -> Option<Arc<InputSlot<V>>> {
        self.input
            .lock()
            .as_ref()
            .map(|channel| Arc::clone(&channel.slot))
    }
}

/// Cloneable handle to an observable value cell
pub struct ValueStream<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ValueStream<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> ValueStream<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a stream named `name` holding `initial` at version 0
    #[must_use]
    pub fn new(name: &'static str, initial: V) -> Self {
        let (tx, rx) = watch::channel(Snapshot {
            version: 0,
            value: initial,
        });
        Self {
            shared: Arc::new(Shared {
                name,
                tx: Mutex::new(Some(tx)),
                rx,
                input: Mutex::new(None),
                update_lock: tokio::sync::Mutex::new(()),
                disposed: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// The current value
    #[must_use]
    pub fn current(&self) -> V {
        self.shared.rx.borrow().value.clone()
    }

    /// The current value and its version
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<V> {
        self.shared.rx.borrow().clone()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.rx.borrow().version
    }

    /// Write `value` as the new current value, returning its version
    ///
    /// Pending raw input is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Disposed` after [`dispose`](Self::dispose).
    pub fn set(&self, value: V) -> Result<u64, StreamError> {
        match self.shared.input_slot() {
            Some(slot) => slot.cancel_then(|| self.shared.publish(value)),
            None => self.shared.publish(value),
        }
    }

    /// Compute a new value from the current one and publish it
    ///
    /// Updates on the same stream run one at a time. If the producer fails,
    /// the current value is left as it was.
    ///
    /// # Errors
    ///
    /// Propagates the producer's error, or `StreamError::Disposed` (converted
    /// into `E`) if the stream was disposed.
    pub async fn update<F, Fut, E>(&self, producer: F) -> Result<V, E>
    where
        F: FnOnce(V) -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: From<StreamError>,
    {
        let _serial = self.shared.update_lock.lock().await;
        if self.is_disposed() {
            return Err(StreamError::Disposed(self.shared.name).into());
        }
        let next = producer(self.current()).await?;
        self.set(next.clone())?;
        Ok(next)
    }

    /// Subscribe to future writes
    ///
    /// The value current at subscription time counts as already seen.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<V> {
        let rx = match self.shared.tx.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                let mut rx = self.shared.rx.clone();
                rx.borrow_and_update();
                rx
            }
        };
        Subscription {
            rx,
            disposed: Arc::clone(&self.shared.disposed),
        }
    }

    /// Route raw input through `transform` before it becomes current
    ///
    /// Raw input lands in a single-value slot, so a burst can never back up:
    /// only the newest value not yet seen by the transform is kept. Replaces
    /// any previously attached transform. Outside a tokio runtime no task can
    /// be spawned, and raw input is then published directly.
    pub fn attach_input<X>(&self, transform: X)
    where
        X: InputTransform<V>,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!(
                stream = self.shared.name,
                "no tokio runtime, raw input will be published directly"
            );
            return;
        }
        let slot = Arc::new(InputSlot::new());
        let weak = Arc::downgrade(&self.shared);
        let task = tokio::spawn(debounce::run(transform, Arc::clone(&slot), move |value| {
            weak.upgrade()
                .is_some_and(|shared| shared.publish(value).is_ok())
        }));
        if let Some(previous) = self.shared.input.lock().replace(InputChannel { slot, task }) {
            previous.slot.close();
            previous.task.abort();
        }
    }

    /// Feed one raw value into the input slot
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Disposed` after [`dispose`](Self::dispose).
    pub fn push_input(&self, value: V) -> Result<(), StreamError> {
        if self.is_disposed() {
            return Err(StreamError::Disposed(self.shared.name));
        }
        match self.shared.input_slot() {
            Some(slot) => {
                if slot.put(value) {
                    Ok(())
                } else {
                    Err(StreamError::Disposed(self.shared.name))
                }
            }
            None => self.shared.publish(value).map(|_| ()),
        }
    }

    /// Close the input channel and all subscriptions; reject further writes
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(channel) = self.shared.input.lock().take() {
            channel.slot.close();
            channel.task.abort();
        }
        self.shared.tx.lock().take();
        debug!(stream = self.shared.name, "stream disposed");
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }
}

/// Receiver side of a [`ValueStream`]
pub struct Subscription<V> {
    rx: watch::Receiver<Snapshot<V>>,
    disposed: Arc<AtomicBool>,
}

impl<V: Clone> Subscription<V> {
    /// Wait for the next write; `None` once the stream is disposed
    pub async fn changed(&mut self) -> Option<Snapshot<V>> {
        self.rx.changed().await.ok()?;
        if self.disposed.load(Ordering::Acquire) {
            return None;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    /// The latest value without waiting
    #[must_use]
    pub fn latest(&self) -> Snapshot<V> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_set_bumps_version() {
        let stream = ValueStream::new("query", String::new());
        assert_eq!(stream.version(), 0);

        assert_eq!(stream.set("a".to_string()), Ok(1));
        assert_eq!(stream.set("ab".to_string()), Ok(2));
        assert_eq!(
            stream.snapshot(),
            Snapshot {
                version: 2,
                value: "ab".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_subscriber_sees_writes() {
        let stream = ValueStream::new("count", 0u32);
        let mut sub = stream.subscribe();

        stream.set(7).unwrap();
        let seen = sub.changed().await.unwrap();
        assert_eq!(seen.value, 7);
        assert_eq!(seen.version, 1);
    }

    #[tokio::test]
    async fn test_dispose_rejects_writes_and_ends_subscriptions() {
        let stream = ValueStream::new("count", 1u32);
        let mut sub = stream.subscribe();

        stream.dispose();
        stream.dispose();

        assert_eq!(stream.set(2), Err(StreamError::Disposed("count")));
        assert_eq!(stream.push_input(3), Err(StreamError::Disposed("count")));
        assert_eq!(stream.current(), 1);
        assert!(sub.changed().await.is_none());
        assert!(stream.subscribe().changed().await.is_none());
    }

    #[tokio::test]
    async fn test_update_failure_keeps_current() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Producer,
            Stream(StreamError),
        }
        impl From<StreamError> for Failure {
            fn from(e: StreamError) -> Self {
                Self::Stream(e)
            }
        }

        let stream = ValueStream::new("count", 10u32);
        let ok: Result<u32, Failure> = stream.update(|v| async move { Ok(v + 1) }).await;
        assert_eq!(ok, Ok(11));

        let failed: Result<u32, Failure> =
            stream.update(|_| async { Err(Failure::Producer) }).await;
        assert_eq!(failed, Err(Failure::Producer));
        assert_eq!(stream.current(), 11);

        stream.dispose();
        let disposed: Result<u32, Failure> = stream.update(|v| async move { Ok(v) }).await;
        assert_eq!(disposed, Err(Failure::Stream(StreamError::Disposed("count"))));
    }

    #[test]
    fn test_push_input_without_runtime_publishes_directly() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(50)));

        stream.push_input("rust".to_string()).unwrap();
        assert_eq!(stream.current(), "rust");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_input_coalesces() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(100)));
        let mut sub = stream.subscribe();

        for text in ["a", "ap", "app"] {
            stream.push_input(text.to_string()).unwrap();
        }
        let seen = sub.changed().await.unwrap();

        assert_eq!(seen.value, "app");
        assert_eq!(seen.version, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_supersedes_pending_input() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(100)));

        stream.push_input("typed".to_string()).unwrap();
        tokio::task::yield_now().await;
        stream.set(String::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(stream.current(), "");
        assert_eq!(stream.version(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_burst_publishes_newest_value() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(100)));

        for len in 1..=300 {
            stream.push_input("x".repeat(len)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(stream.current(), "x".repeat(300));
        assert_eq!(stream.version(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_wins_over_burst_of_pending_input() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(100)));

        for text in ["t", "ty", "typ", "type", "typed"] {
            stream.push_input(text.to_string()).unwrap();
            tokio::task::yield_now().await;
        }
        stream.set(String::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(stream.current(), "");
        assert_eq!(stream.version(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_set_is_never_overwritten_by_racing_input() {
        let stream = ValueStream::new("query", String::new());
        stream.attach_input(Debounce::new(Duration::from_millis(1)));

        for round in 0..50 {
            stream.push_input(format!("typed {round}")).unwrap();
            std::thread::sleep(Duration::from_millis(1));
            stream.set(format!("direct {round}")).unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert_eq!(stream.current(), format!("direct {round}"));
        }
    }
}
