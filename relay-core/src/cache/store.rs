//! DataCache Implementation
//!
//! A DataCache owns one value of a caller-defined model type and tells every
//! subscriber about each change to it.
//!
//! # How the Cache Works
//!
//! 1. All reads and writes go through a single mutex, so the cache behaves
//!    like an actor: operations run one at a time in the order they acquire
//!    the lock.
//!
//! 2. A write compares the new value with the old one. Equal values are
//!    dropped without touching the revision or waking anyone.
//!
//! 3. An effective write bumps the revision and sends a copy of the model
//!    into each subscriber's watch channel while the lock is still held. Each subscriber therefore sees changes in the order they were
//!    applied, possibly with intermediate values coalesced away.
//!
//! # Lifetime
//!
//! Handles are cheap to clone and share one store. Subscriptions hold only a
//! weak reference, so they never keep the store alive. When the store is
//! destroyed, explicitly or by dropping the last handle, every subscription
//! is closed.

use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::merge::merge_append;
use crate::config::{CacheConfig, DEFAULT_CACHE_LABEL};
use crate::subscription::{Registry, Subscription};

/// Shared application state with change notification.
///
/// # Type Parameters
///
/// - `M`: The model. Prefer plain value types; equality decides whether a
///   write counts as a change.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, PartialEq)]
/// struct Model { count: u32, items: Vec<u32> }
///
/// let cache = DataCache::new(Model { count: 0, items: vec![] });
/// let mut values = cache.values(true);
///
/// cache.update_field(|m| &mut m.count, 5);
/// cache.populate(|m| &mut m.items, [1, 2]);
/// ```
pub struct DataCache<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    shared: Arc<Shared<M>>,
}

struct Shared<M> {
    label: String,
    state: Mutex<State<M>>,
}

struct State<M> {
    value: M,
    revision: u64,
    subscribers: Registry<M>,
    destroyed: bool,
}

impl<M: Clone> State<M> {
    /// Record an effective change and fan it out.
    fn commit(&mut self, label: &str) {
        self.revision += 1;
        self.subscribers.broadcast(&self.value);

        tracing::debug!(
            cache = label,
            revision = self.revision,
            subscribers = self.subscribers.len(),
            "cache value changed"
        );
    }
}

impl<M> Drop for Shared<M> {
    fn drop(&mut self) {
        self.state.get_mut().subscribers.close_all();
    }
}

impl<M> DataCache<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new cache holding `value`.
    pub fn new(value: M) -> Self {
        Self::with_config(value, &CacheConfig::default())
    }

    /// Create a new cache holding `value`, labelled according to `config`.
    pub fn with_config(value: M, config: &CacheConfig) -> Self {
        let label = config
            .label
            .clone()
            .unwrap_or_else(|| DEFAULT_CACHE_LABEL.to_string());

        Self {
            shared: Arc::new(Shared {
                label,
                state: Mutex::new(State {
                    value,
                    revision: 0,
                    subscribers: Registry::new(),
                    destroyed: false,
                }),
            }),
        }
    }

    /// The label used in log output.
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Get a copy of the current value.
    pub fn value(&self) -> M {
        self.shared.state.lock().value.clone()
    }

    /// Read the current value without cloning it.
    ///
    /// The cache is locked while `f` runs, so `f` must not call back into
    /// this cache.
    pub fn with<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.shared.state.lock().value)
    }

    /// Number of effective changes applied so far.
    pub fn revision(&self) -> u64 {
        self.shared.state.lock().revision
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    /// True once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.shared.state.lock().destroyed
    }

    /// Subscribe to changes.
    ///
    /// Each call returns a new, independent stream. Unless `skip_initial` is
    /// set, the stream starts with the value current at the time of the
    /// call. Dropping the stream unsubscribes it. On a destroyed cache the
    /// returned stream has already ended.
    pub fn values(&self, skip_initial: bool) -> Subscription<M> {
        let (id, receiver) = {
            let mut state = self.shared.state.lock();
            if state.destroyed {
                return Subscription::closed(state.value.clone());
            }

            let current = state.value.clone();
            state.subscribers.register(current)
        };

        tracing::trace!(cache = %self.shared.label, subscriber = %id, skip_initial, "subscribed");

        let store: Weak<Shared<M>> = Arc::downgrade(&self.shared);
        Subscription::new(id, receiver, !skip_initial, move |id| {
            if let Some(shared) = store.upgrade() {
                if shared.state.lock().subscribers.remove(id) {
                    tracing::trace!(cache = %shared.label, subscriber = %id, "unsubscribed");
                }
            }
        })
    }

    /// Replace the whole value.
    ///
    /// Nothing happens if `value` equals the current value. Returns whether
    /// the value changed.
    pub fn update(&self, value: M) -> bool {
        let mut state = self.shared.state.lock();
        if state.value == value {
            tracing::trace!(cache = %self.shared.label, "update skipped, value unchanged");
            return false;
        }

        state.value = value;
        state.commit(&self.shared.label);
        true
    }

    /// Replace one field of the value.
    ///
    /// `field` selects the field to write. The write is skipped, and nothing
    /// is broadcast, when the field already holds `value`.
    ///
    /// ```rust,ignore
    /// cache.update_field(|m| &mut m.count, 5);
    /// ```
    pub fn update_field<T, F>(&self, field: F, value: T) -> bool
    where
        T: PartialEq,
        F: FnOnce(&mut M) -> &mut T,
    {
        let mut state = self.shared.state.lock();
        let slot = field(&mut state.value);
        if *slot == value {
            tracing::trace!(cache = %self.shared.label, "field update skipped, value unchanged");
            return false;
        }

        *slot = value;
        state.commit(&self.shared.label);
        true
    }

    /// Apply an arbitrary in-place edit.
    ///
    /// The edit runs on a copy; the result is committed only if it differs
    /// from the current value.
    pub fn mutate<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut M),
    {
        let mut state = self.shared.state.lock();
        let mut next = state.value.clone();
        edit(&mut next);
        if next == state.value {
            tracing::trace!(cache = %self.shared.label, "mutation skipped, value unchanged");
            return false;
        }

        state.value = next;
        state.commit(&self.shared.label);
        true
    }

    /// Merge `items` into a collection field.
    ///
    /// Items already in the collection move to the position of their
    /// incoming copy; new items are appended. See
    /// [`merge_append`](super::merge_append). An empty `items` is a no-op.
    pub fn populate<T, F, I>(&self, field: F, items: I) -> bool
    where
        T: PartialEq + Clone,
        F: FnOnce(&mut M) -> &mut Vec<T>,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return false;
        }

        let mut state = self.shared.state.lock();
        let collection = field(&mut state.value);
        let merged = merge_append(collection.as_slice(), items);
        if *collection == merged {
            tracing::trace!(cache = %self.shared.label, "populate skipped, collection unchanged");
            return false;
        }

        *collection = merged;
        state.commit(&self.shared.label);
        true
    }

    /// Merge `items` into an optional collection field.
    ///
    /// An absent collection is treated as empty.
    pub fn populate_optional<T, F, I>(&self, field: F, items: I) -> bool
    where
        T: PartialEq + Clone,
        F: FnOnce(&mut M) -> &mut Option<Vec<T>>,
        I: IntoIterator<Item = T>,
    {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return false;
        }

        let mut state = self.shared.state.lock();
        let collection = field(&mut state.value);
        let merged = merge_append(collection.as_deref().unwrap_or_default(), items);
        if collection.as_ref() == Some(&merged) {
            tracing::trace!(cache = %self.shared.label, "populate skipped, collection unchanged");
            return false;
        }

        *collection = Some(merged);
        state.commit(&self.shared.label);
        true
    }

    /// Close every subscription and stop accepting new ones.
    ///
    /// The value stays readable and writable afterwards, but nobody is
    /// notified. Calling this more than once is harmless.
    pub fn destroy(&self) {
        let mut state = self.shared.state.lock();
        if state.destroyed {
            return;
        }

        let closed = state.subscribers.len();
        state.destroyed = true;
        state.subscribers.close_all();

        tracing::debug!(cache = %self.shared.label, closed, "cache destroyed");
    }
}

impl<M> Clone for DataCache<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M> Debug for DataCache<M>
where
    M: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("DataCache")
            .field("label", &self.shared.label)
            .field("value", &state.value)
            .field("revision", &state.revision)
            .field("subscriber_count", &state.subscribers.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
