//! Relay Core
//!
//! This crate provides shared state primitives for UI applications.
//! It implements:
//!
//! - A reactive data cache with change broadcast to any number of subscribers
//! - A priority queue of pending UI actions with a single presenter
//! - Value types describing the state of asynchronous work
//!
//! Nothing here depends on a particular UI toolkit. A view layer reads the
//! cache through subscriptions, and binds one presentation slot to each
//! actions queue.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `cache`: The data cache, collection merging and snapshots
//! - `queue`: Action priorities, the actions queue and its presenter
//! - `subscription`: Latest-wins streams shared by both of the above
//! - `resource`: Loading/failure state for remote data and operations
//! - `config`: Optional labels for log output
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use relay_core::cache::DataCache;
//!
//! #[derive(Clone, PartialEq)]
//! struct Model { count: u32, items: Vec<u32> }
//!
//! let cache = DataCache::new(Model { count: 0, items: vec![] });
//! let mut values = cache.values(false);
//!
//! cache.update_field(|m| &mut m.count, 5);
//! cache.populate(|m| &mut m.items, [1, 2]);
//!
//! // Latest wins: a consumer that was not polling sees only the newest value.
//! let latest = values.next().await.unwrap();
//! assert_eq!(latest.items, vec![1, 2]);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod queue;
pub mod resource;
pub mod subscription;

pub use cache::{CacheSnapshot, DataCache};
pub use config::{CacheConfig, Config, QueueConfig};
pub use error::{Error, Result};
pub use queue::{ActionsQueue, Presenter, Priority, QueueAction};
pub use resource::{AsyncOperation, Operation, Resource, ResourceStreamExt};
pub use subscription::{SubscriberId, Subscription};
