//! Asynchronous Operation State
//!
//! Plain value types describing the state of remote work, ready to be stored
//! in a [`DataCache`](crate::cache::DataCache) model.
//!
//! - [`Resource`] describes loaded data. Its flags are not exclusive: a
//!   resource can hold content and an error at the same time, which is how a
//!   failed refresh of already-loaded data is represented.
//! - [`Operation`] describes work that produces no data, such as a save.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{ready, Stream};
use serde::{Deserialize, Serialize};

/// Common view over asynchronous operation state.
pub trait AsyncOperation {
    /// Error type carried on failure.
    type Failure;

    fn is_loading(&self) -> bool;

    fn has_failed(&self) -> bool;

    fn error(&self) -> Option<&Self::Failure>;
}

/// Asynchronously loaded data and its loading state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<C, E> {
    /// Content, if it was loaded.
    pub content: Option<C>,
    /// True while a load or refresh is in flight.
    pub is_loading: bool,
    /// Error from the last load or refresh.
    pub error: Option<E>,
}

impl<C, E> Resource<C, E> {
    pub fn new(content: Option<C>, is_loading: bool, error: Option<E>) -> Self {
        Self {
            content,
            is_loading,
            error,
        }
    }

    /// Loaded content, not loading, no error.
    pub fn loaded(content: C) -> Self {
        Self::new(Some(content), false, None)
    }

    /// Failed load without content.
    pub fn failed(error: E) -> Self {
        Self::new(None, false, Some(error))
    }

    /// Initial load in flight.
    pub fn loading() -> Self {
        Self::new(None, true, None)
    }

    /// True when loading while content is already present.
    pub fn is_refreshing(&self) -> bool {
        self.is_loading && self.has_content()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl<C, E> Default for Resource<C, E> {
    fn default() -> Self {
        Self::new(None, false, None)
    }
}

impl<C, E> From<Result<C, E>> for Resource<C, E> {
    fn from(result: Result<C, E>) -> Self {
        match result {
            Ok(content) => Self::loaded(content),
            Err(error) => Self::failed(error),
        }
    }
}

impl<C, E> AsyncOperation for Resource<C, E> {
    type Failure = E;

    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn has_failed(&self) -> bool {
        Resource::has_failed(self)
    }

    fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }
}

/// State of an asynchronous operation that produces no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation<E> {
    Inactive,
    Loading,
    Success,
    Failure(E),
}

impl<E> Default for Operation<E> {
    fn default() -> Self {
        Operation::Inactive
    }
}

// Equality ignores the failure payload: any two failures compare equal.
impl<E> PartialEq for Operation<E> {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl<E> Eq for Operation<E> {}

impl<E> AsyncOperation for Operation<E> {
    type Failure = E;

    fn is_loading(&self) -> bool {
        matches!(self, Operation::Loading)
    }

    fn has_failed(&self) -> bool {
        matches!(self, Operation::Failure(_))
    }

    fn error(&self) -> Option<&E> {
        match self {
            Operation::Failure(error) => Some(error),
            _ => None,
        }
    }
}

/// Stream adapter produced by [`ResourceStreamExt::resource`].
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct Resources<S> {
    inner: S,
    failed: bool,
}

impl<S, C, E> Stream for Resources<S>
where
    S: Stream<Item = Result<C, E>> + Unpin,
{
    type Item = Resource<C, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.failed {
            return Poll::Ready(None);
        }

        match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
            Some(Ok(content)) => Poll::Ready(Some(Resource::loaded(content))),
            Some(Err(error)) => {
                self.failed = true;
                Poll::Ready(Some(Resource::failed(error)))
            }
            None => Poll::Ready(None),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        // Any item may be an error that ends the stream.
        let (_, upper) = self.inner.size_hint();
        (0, upper)
    }
}

/// Turns a stream of results into a stream of [`Resource`] values.
pub trait ResourceStreamExt<C, E>: Stream<Item = Result<C, E>> + Sized {
    /// Map `Ok` items to loaded resources and the first `Err` to a failed
    /// one. The stream ends after that failure.
    fn resource(self) -> Resources<Self> {
        Resources {
            inner: self,
            failed: false,
        }
    }
}

impl<S, C, E> ResourceStreamExt<C, E> for S where S: Stream<Item = Result<C, E>> {}
