//! Subscriptions
//!
//! A Subscription is one consumer's view of a value that changes over time.
//! Both the data cache and the actions queue hand these out.
//!
//! # Delivery
//!
//! Every subscription is the receiving half of its own `tokio::sync::watch`
//! channel. Sending replaces the value the channel holds, so a slow consumer
//! only ever sees the most recent value and never builds a backlog. The
//! producer never waits on a consumer.
//!
//! # Cancellation
//!
//! Dropping a subscription runs its unregister callback, which removes the
//! sender from the owner's registry. The owner performs broadcasts and
//! removals under its own lock, so the two can never interleave. Dropping a
//! sender ends its stream once the last sent value has been read.

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::{FutureExt, Stream, StreamExt};
use indexmap::IndexMap;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Unique identifier for a subscriber.
///
/// Every call that hands out a subscription gets a fresh ID, which keys the
/// subscription in its owner's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Unregister = Box<dyn FnOnce(SubscriberId) + Send + Sync>;

/// An independent, latest-wins stream of values.
///
/// # Example
///
/// ```rust,ignore
/// use futures_util::StreamExt;
///
/// let mut values = cache.values(false);
/// while let Some(value) = values.next().await {
///     println!("{value:?}");
/// }
/// ```
pub struct Subscription<T> {
    id: SubscriberId,
    stream: WatchStream<T>,
    status: watch::Receiver<T>,
    unregister: Option<Unregister>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a registered receiver. With `replay` set, the stream starts with
    /// the value the channel currently holds.
    pub(crate) fn new<F>(
        id: SubscriberId,
        receiver: watch::Receiver<T>,
        replay: bool,
        unregister: F,
    ) -> Self
    where
        F: FnOnce(SubscriberId) + Send + Sync + 'static,
    {
        let status = receiver.clone();
        let stream = if replay {
            WatchStream::new(receiver)
        } else {
            WatchStream::from_changes(receiver)
        };

        Self {
            id,
            stream,
            status,
            unregister: Some(Box::new(unregister)),
        }
    }

    /// A subscription that has already ended and yields nothing.
    pub(crate) fn closed(last: T) -> Self {
        let (sender, receiver) = watch::channel(last);
        drop(sender);
        Self {
            id: SubscriberId::new(),
            status: receiver.clone(),
            stream: WatchStream::from_changes(receiver),
            unregister: None,
        }
    }

    /// Take the pending value without waiting.
    ///
    /// Returns `None` when nothing has been delivered since the last read.
    pub fn try_recv(&mut self) -> Option<T> {
        self.stream.next().now_or_never().flatten()
    }
}

impl<T> Subscription<T> {
    /// Get the subscription's ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// True once the owner has closed the stream.
    ///
    /// A value sent right before closing is still delivered by the stream.
    pub fn is_closed(&self) -> bool {
        self.status.has_changed().is_err()
    }
}

impl<T> Stream for Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.stream.poll_next_unpin(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister(self.id);
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Registry of live subscriber channels, kept in registration order.
///
/// Owners keep this behind the same lock that guards their value.
pub(crate) struct Registry<T> {
    senders: IndexMap<SubscriberId, watch::Sender<T>>,
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: IndexMap::new(),
        }
    }

    /// Open and register a channel holding `current`.
    ///
    /// The returned receiver has already seen `current`.
    pub(crate) fn register(&mut self, current: T) -> (SubscriberId, watch::Receiver<T>) {
        let id = SubscriberId::new();
        let (sender, receiver) = watch::channel(current);
        self.senders.insert(id, sender);
        (id, receiver)
    }

    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        self.senders.shift_remove(&id).is_some()
    }

    /// Drop every sender, ending each stream after its last value.
    pub(crate) fn close_all(&mut self) {
        self.senders.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}

impl<T: Clone> Registry<T> {
    /// Deliver a copy of `value` to every registered channel, replacing
    /// whatever each one still holds.
    pub(crate) fn broadcast(&self, value: &T) {
        for sender in self.senders.values() {
            sender.send_replace(value.clone());
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
