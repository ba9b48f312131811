//! Collection merging used by [`DataCache::populate`](super::DataCache::populate).

/// Merge `incoming` into `existing`.
///
/// Elements of `existing` that also appear in `incoming` are dropped from
/// their old position. The survivors keep their relative order and are
/// followed by `incoming` in the order given. An element present in both
/// therefore moves to where the incoming copy sits.
///
/// Membership is checked with `PartialEq` alone, so the cost is
/// O(existing × incoming). Fine for UI-sized lists; for very large
/// collections merge smaller batches.
///
/// ```rust,ignore
/// assert_eq!(merge_append(&[1, 2], vec![2, 3]), vec![1, 2, 3]);
/// assert_eq!(merge_append(&[1, 2, 3], vec![1]), vec![2, 3, 1]);
/// ```
pub fn merge_append<T>(existing: &[T], incoming: Vec<T>) -> Vec<T>
where
    T: PartialEq + Clone,
{
    let mut merged: Vec<T> = existing
        .iter()
        .filter(|item| !incoming.contains(item))
        .cloned()
        .collect();
    merged.extend(incoming);
    merged
}
