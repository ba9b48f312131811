//! Reactive Data Cache
//!
//! This module implements the shared state container: a single value that
//! many components read and any component may write, with every effective
//! change pushed to all subscribers.
//!
//! # Concepts
//!
//! ## DataCache
//!
//! A DataCache holds one model value. Writes are serialized through the
//! cache and compared against the current value, so writing an equal value
//! is free and silent. Field-level writes take a selector closure instead of
//! a key path, which keeps every write statically typed.
//!
//! ## Subscriptions
//!
//! `values()` hands out a fresh latest-wins stream per call. A consumer that
//! falls behind skips straight to the newest value instead of replaying a
//! backlog.
//!
//! ## Snapshots
//!
//! A CacheSnapshot mirrors the cache into a plain value through a background
//! task, for code that wants to read state without awaiting.

mod merge;
mod snapshot;
mod store;

pub use merge::merge_append;
pub use snapshot::CacheSnapshot;
pub use store::DataCache;
