//! Integration Tests for the Cache and the Actions Queue
//!
//! These tests drive the public API the way a view layer would: awaiting
//! subscriptions, enqueueing from several producers, dismissing through the
//! presenter.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;

use relay_core::cache::{CacheSnapshot, DataCache};
use relay_core::queue::{ActionsQueue, Priority, QueueAction};

#[derive(Debug, Clone, PartialEq)]
struct Model {
    count: i32,
    items: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
struct Alert {
    id: &'static str,
    priority: Priority,
}

impl QueueAction for Alert {
    type Id = &'static str;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn priority(&self) -> Priority {
        self.priority
    }
}

fn alert(id: &'static str, priority: Priority) -> Alert {
    Alert { id, priority }
}

const WAIT: Duration = Duration::from_secs(1);

/// Walk through field updates and merges, checking each broadcast.
#[tokio::test]
async fn cache_scenario_broadcasts_each_change() {
    let cache = DataCache::new(Model {
        count: 0,
        items: vec![],
    });
    let mut values = cache.values(true);

    cache.update_field(|m| &mut m.count, 5);
    let value = timeout(WAIT, values.next()).await.unwrap().unwrap();
    assert_eq!(value, Model { count: 5, items: vec![] });

    cache.populate(|m| &mut m.items, [1, 2]);
    let value = timeout(WAIT, values.next()).await.unwrap().unwrap();
    assert_eq!(value.items, vec![1, 2]);

    cache.populate(|m| &mut m.items, [2, 3]);
    let value = timeout(WAIT, values.next()).await.unwrap().unwrap();
    assert_eq!(value, Model { count: 5, items: vec![1, 2, 3] });
}

/// A same-value write must not produce an element; the next element is the
/// later, different value.
#[tokio::test]
async fn same_value_update_is_not_emitted() {
    let cache = DataCache::new(1);
    let mut values = cache.values(false);
    assert_eq!(values.next().await, Some(1));

    cache.update(1);
    cache.update(2);

    assert_eq!(timeout(WAIT, values.next()).await.unwrap(), Some(2));
}

/// The first element of a skip-initial stream is the first change.
#[tokio::test]
async fn skip_initial_waits_for_first_change() {
    let cache = DataCache::new(1);
    let mut values = cache.values(true);

    let writer = cache.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        writer.update(2);
    });

    assert_eq!(timeout(WAIT, values.next()).await.unwrap(), Some(2));
    handle.await.unwrap();
}

/// Two subscriptions receive their own initial value and the same update.
#[tokio::test]
async fn every_subscriber_receives_every_change() {
    let cache = DataCache::new(0);
    let mut a = cache.values(false);
    let mut b = cache.values(false);

    assert_eq!(a.next().await, Some(0));
    assert_eq!(b.next().await, Some(0));

    cache.update(1);

    assert_eq!(timeout(WAIT, a.next()).await.unwrap(), Some(1));
    assert_eq!(timeout(WAIT, b.next()).await.unwrap(), Some(1));
}

/// Re-merging items that are already present reorders them but never
/// duplicates them.
#[tokio::test]
async fn repeated_populate_repositions_without_duplicates() {
    let cache = DataCache::new(Model {
        count: 0,
        items: vec![1, 2, 3],
    });
    let mut values = cache.values(true);

    assert!(cache.populate(|m| &mut m.items, [1, 2]));
    let value = timeout(WAIT, values.next()).await.unwrap().unwrap();
    assert_eq!(value.items, vec![3, 1, 2]);

    assert!(!cache.populate(|m| &mut m.items, [1, 2]));
    assert_eq!(cache.value().items, vec![3, 1, 2]);
    assert_eq!(values.try_recv(), None);
}

/// Destroying the cache ends every stream.
#[tokio::test]
async fn destroy_ends_streams() {
    let cache = DataCache::new(0);
    let mut values = cache.values(true);

    let destroyer = cache.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        destroyer.destroy();
    });

    assert_eq!(timeout(WAIT, values.next()).await.unwrap(), None);
}

/// A slow consumer sees the latest value and in-order progress only.
#[tokio::test]
async fn slow_consumer_sees_latest_value() {
    let cache = DataCache::new(0);
    let mut values = cache.values(true);

    for n in 1..=100 {
        cache.update(n);
    }

    assert_eq!(values.next().await, Some(100));
    assert_eq!(values.try_recv(), None);
}

/// Concurrent writers are serialized and every increment lands.
#[test]
fn concurrent_writers_are_serialized() {
    let cache = DataCache::new(0u32);

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    cache.mutate(|value| *value += 1);
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(cache.value(), 2000);
    assert_eq!(cache.revision(), 2000);
}

/// Subscribing and dropping subscriptions while another thread writes
/// never leaves registrations behind.
#[test]
fn unsubscribe_races_with_broadcast() {
    let cache = DataCache::new(0u64);
    let writer = {
        let cache = cache.clone();
        thread::spawn(move || {
            for n in 1..=2_000 {
                cache.update(n);
            }
        })
    };

    let subscribers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let mut values = cache.values(false);
                    let _ = values.try_recv();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for subscriber in subscribers {
        subscriber.join().unwrap();
    }

    assert_eq!(cache.subscriber_count(), 0);
    assert_eq!(cache.value(), 2_000);
}

/// Snapshots follow the cache until stopped.
#[tokio::test]
async fn snapshot_tracks_cache() {
    let cache = DataCache::new(1);
    let mut snapshot = CacheSnapshot::new(&cache);
    snapshot.start_observing(true).unwrap();

    cache.update(7);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(snapshot.value(), 7);
    assert!(snapshot.is_observing());

    drop(snapshot);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.subscriber_count(), 0);
}

/// Mixed priorities land in band order, FIFO within a band.
#[test]
fn queue_orders_by_priority() {
    let (queue, _presenter) = ActionsQueue::new();
    queue.add(alert("a", Priority::Normal));
    queue.add(alert("b", Priority::High));
    queue.add(alert("c", Priority::Highest));
    queue.add(alert("d", Priority::High));

    let ids: Vec<_> = queue.actions().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["c", "b", "d", "a"]);
}

/// Re-adding a queued id keeps its position.
#[test]
fn queue_replaces_duplicate_ids_in_place() {
    let (queue, _presenter) = ActionsQueue::new();
    queue.add(alert("1", Priority::Normal));
    queue.add(alert("2", Priority::High));
    queue.add(alert("1", Priority::Normal));

    let ids: Vec<_> = queue.actions().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["2", "1"]);
}

/// Head changes as actions arrive and finish.
#[tokio::test]
async fn queue_scenario_head_follows_priority() {
    let (queue, presenter) = ActionsQueue::new();
    let mut heads = presenter.changes();
    assert_eq!(heads.next().await, Some(None));

    queue.add(alert("a", Priority::High));
    assert_eq!(heads.next().await.flatten().map(|a| a.id), Some("a"));

    queue.add(alert("b", Priority::Highest));
    assert_eq!(heads.next().await.flatten().map(|a| a.id), Some("b"));
    let ids: Vec<_> = queue.actions().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec!["b", "a"]);

    queue.finish_current();
    assert_eq!(heads.next().await.flatten().map(|a| a.id), Some("a"));
    assert_eq!(presenter.current().map(|a| a.id), Some("a"));
}

/// Swapping the head for a different action announces the new head.
#[tokio::test]
async fn replaced_head_is_announced_to_presenter() {
    let (queue, presenter) = ActionsQueue::new();
    queue.add(alert("1", Priority::Normal));
    queue.add(alert("2", Priority::Normal));
    let mut heads = presenter.changes();
    assert_eq!(heads.next().await.flatten().map(|a| a.id), Some("1"));

    queue.replace_first_action(|a| a.id == "1", alert("3", Priority::Normal));
    let head = timeout(WAIT, heads.next()).await.unwrap().flatten();
    assert_eq!(head.map(|a| a.id), Some("3"));
    assert_eq!(presenter.current().map(|a| a.id), Some("3"));
}

/// Removing the head by predicate promotes the next action.
#[tokio::test]
async fn removing_head_by_predicate_promotes_next() {
    let (queue, presenter) = ActionsQueue::new();
    queue.add(alert("3", Priority::Normal));
    queue.add(alert("2", Priority::Normal));
    let mut heads = queue.heads();
    assert_eq!(heads.next().await.flatten().map(|a| a.id), Some("3"));

    assert_eq!(queue.finish_all_where(|a| a.id == "3"), 1);
    let head = timeout(WAIT, heads.next()).await.unwrap().flatten();
    assert_eq!(head.map(|a| a.id), Some("2"));
    assert_eq!(presenter.current().map(|a| a.id), Some("2"));
}

/// Dismissing through the presenter walks the queue in order.
#[tokio::test]
async fn presenter_dismissal_advances_queue() {
    let (queue, mut presenter) = ActionsQueue::new();
    let producer = queue.clone();
    producer.add(alert("x", Priority::Normal));
    producer.add(alert("y", Priority::Normal));

    let mut shown = Vec::new();
    while let Some(current) = presenter.current() {
        shown.push(current.id);
        presenter.dismiss();
    }

    assert_eq!(shown, vec!["x", "y"]);
    assert!(queue.is_empty());
    assert!(presenter.dismiss().is_none());
}

/// Producers on many threads never duplicate an id.
#[test]
fn concurrent_producers_keep_ids_unique() {
    let (queue, _presenter) = ActionsQueue::new();
    let ids: Arc<[&'static str]> = Arc::from(vec!["a", "b", "c", "d"]);

    let producers: Vec<_> = (0..4)
        .map(|n| {
            let queue = queue.clone();
            let ids = Arc::clone(&ids);
            thread::spawn(move || {
                for round in 0..100 {
                    let priority = if (n + round) % 2 == 0 {
                        Priority::Normal
                    } else {
                        Priority::High
                    };
                    queue.add(alert(ids[(n + round) % ids.len()], priority));
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }

    let mut queued: Vec<_> = queue.actions().iter().map(|a| a.id).collect();
    queued.sort_unstable();
    assert_eq!(queued, vec!["a", "b", "c", "d"]);
}

/// A replace-all action clears everything and is presented at once.
#[test]
fn replace_all_takes_over_presentation() {
    let (queue, presenter) = ActionsQueue::new();
    queue.add(alert("a", Priority::Normal));
    queue.add(alert("b", Priority::Normal));
    queue.add(alert("c", Priority::Normal));
    queue.add(alert("z", Priority::ReplaceAll));

    assert_eq!(queue.len(), 1);
    assert_eq!(presenter.current().map(|a| a.id), Some("z"));
}
