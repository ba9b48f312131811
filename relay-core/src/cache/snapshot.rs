//! Cache Snapshot
//!
//! A snapshot mirrors a [`DataCache`] into a plain value that can be read
//! synchronously, for consumers that poll state instead of awaiting a
//! stream. A background tokio task drains a subscription into the mirror.

use std::fmt::{self, Debug};
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::DataCache;
use crate::error::{Error, Result};

/// A locally readable mirror of a [`DataCache`].
pub struct CacheSnapshot<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    cache: DataCache<M>,
    value: Arc<Mutex<M>>,
    observer: Option<JoinHandle<()>>,
}

impl<M> CacheSnapshot<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a snapshot holding the cache's current value.
    pub fn new(cache: &DataCache<M>) -> Self {
        let value = cache.value();
        Self::with_initial(cache, value)
    }

    /// Create a snapshot holding `value` until the first observed change.
    pub fn with_initial(cache: &DataCache<M>, value: M) -> Self {
        Self {
            cache: cache.clone(),
            value: Arc::new(Mutex::new(value)),
            observer: None,
        }
    }

    /// The mirrored value.
    pub fn value(&self) -> M {
        self.value.lock().clone()
    }

    /// True while an observer task is attached.
    pub fn is_observing(&self) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|observer| !observer.is_finished())
    }

    /// Start mirroring cache changes, replacing any previous observer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_observing(&mut self, skip_initial: bool) -> Result<()> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        self.stop_observing();

        let mut values = self.cache.values(skip_initial);
        let mirror = Arc::clone(&self.value);
        let label = self.cache.label().to_string();

        self.observer = Some(handle.spawn(async move {
            while let Some(value) = values.next().await {
                *mirror.lock() = value;
            }
            tracing::trace!(cache = %label, "snapshot observer finished");
        }));
        Ok(())
    }

    /// Stop mirroring. Later cache changes are not reflected.
    pub fn stop_observing(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.abort();
        }
    }
}

impl<M> Drop for CacheSnapshot<M>
where
    M: Clone + PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.stop_observing();
    }
}

impl<M> Debug for CacheSnapshot<M>
where
    M: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSnapshot")
            .field("value", &*self.value.lock())
            .field("observing", &self.is_observing())
            .finish()
    }
}
