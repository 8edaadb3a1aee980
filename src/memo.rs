//! Snapshot-keyed memoization for store queries.
//!
//! Results are cached under `(SnapshotId, argument)`. A mutated store always
//! carries a new [`SnapshotId`], so entries for an old snapshot are simply
//! never looked up again; nothing is invalidated by hand. The cache is
//! bounded and evicts the least recently used entry once full, which is
//! also how stale snapshots eventually leave it.

use std::hash::Hash;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::config::StoreConfig;
use crate::model::RelationRecord;
use crate::store::{RelationStore, Relations, SnapshotId};

// ============================================================================
// SnapshotMemo
// ============================================================================

/// Counters describing cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct Slot<V> {
    value: Arc<V>,
    last_used: u64,
}

struct MemoInner<K, V> {
    slots: HashMap<(SnapshotId, K), Slot<V>>,
    /// Logical clock for LRU ordering.
    clock: u64,
    stats: MemoStats,
}

/// Bounded cache keyed by snapshot identity plus an argument.
///
/// Lookups take `&self`; the table sits behind a `parking_lot::Mutex`.
/// A capacity of zero turns caching off.
pub struct SnapshotMemo<K, V> {
    capacity: usize,
    inner: Mutex<MemoInner<K, V>>,
}

impl<K: Clone + Eq + Hash, V> SnapshotMemo<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(MemoInner {
                slots: HashMap::new(),
                clock: 0,
                stats: MemoStats::default(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value for `(snapshot, key)`, computing and storing
    /// it on a miss.
    ///
    /// `compute` runs without the lock held. If another caller filled the
    /// slot in the meantime, its value wins so every caller sees the same `Arc`.
    pub fn get_or_compute(&self, snapshot: SnapshotId, key: &K, compute: impl FnOnce() -> V) -> Arc<V> {
        let slot_key = (snapshot, key.clone());
        {
            let mut inner = self.inner.lock();
            inner.clock += 1;
            let now = inner.clock;
            if let Some(slot) = inner.slots.get_mut(&slot_key) {
                slot.last_used = now;
                let value = Arc::clone(&slot.value);
                inner.stats.hits += 1;
                tracing::trace!(%snapshot, "memo hit");
                return value;
            }
            inner.stats.misses += 1;
        }

        tracing::trace!(%snapshot, "memo miss");
        let value = Arc::new(compute());
        if self.capacity == 0 {
            return value;
        }

        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;
        let value = Arc::clone(
            &inner
                .slots
                .entry(slot_key)
                .or_insert(Slot { value, last_used: now })
                .value,
        );
        while inner.slots.len() > self.capacity {
            inner.evict_lru();
        }
        inner.stats.entries = inner.slots.len();
        value
    }

    /// Whether a value for `(snapshot, key)` is cached. Does not touch LRU order.
    pub fn contains(&self, snapshot: SnapshotId, key: &K) -> bool {
        self.inner.lock().slots.contains_key(&(snapshot, key.clone()))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MemoStats {
        self.inner.lock().stats
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.slots.clear();
        inner.stats.entries = 0;
    }
}

impl<K: Clone + Eq + Hash, V> MemoInner<K, V> {
    fn evict_lru(&mut self) {
        let oldest = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.slots.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!(snapshot = %key.0, "memo evicted least recently used entry");
        }
    }
}

impl<K, V> std::fmt::Debug for SnapshotMemo<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SnapshotMemo")
            .field("capacity", &self.capacity)
            .field("stats", &inner.stats)
            .finish()
    }
}

// ============================================================================
// MemoizedQuery
// ============================================================================

/// A pure query over a store snapshot, memoized per `(snapshot, argument)`.
pub struct MemoizedQuery<R: RelationRecord, A, V> {
    query: fn(&RelationStore<R>, &A) -> V,
    memo: SnapshotMemo<A, V>,
}

impl<R, A, V> MemoizedQuery<R, A, V>
where
    R: RelationRecord,
    A: Clone + Eq + Hash,
{
    pub fn new(query: fn(&RelationStore<R>, &A) -> V, capacity: usize) -> Self {
        Self { query, memo: SnapshotMemo::new(capacity) }
    }

    pub fn call(&self, store: &RelationStore<R>, arg: &A) -> Arc<V> {
        self.memo
            .get_or_compute(store.snapshot_id(), arg, || (self.query)(store, arg))
    }

    pub fn memo(&self) -> &SnapshotMemo<A, V> {
        &self.memo
    }
}

impl<R: RelationRecord, A, V> std::fmt::Debug for MemoizedQuery<R, A, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizedQuery").field("memo", &self.memo).finish()
    }
}

/// Memoized [`RelationStore::filter_by_id`].
pub type FilterByIdMemo<R> = MemoizedQuery<R, <R as RelationRecord>::Id, Relations<R>>;

impl<R: RelationRecord + Clone> MemoizedQuery<R, R::Id, Relations<R>> {
    pub fn filter_by_id_with_capacity(capacity: usize) -> Self {
        Self::new(RelationStore::filter_by_id, capacity)
    }

    pub fn filter_by_id_with_config(config: &StoreConfig) -> Self {
        Self::filter_by_id_with_capacity(config.memo_capacity)
    }

    /// Records in `store` with `id` as a party, shared across repeated calls
    /// on the same snapshot.
    pub fn filter_by_id(&self, store: &RelationStore<R>, id: &R::Id) -> Arc<Relations<R>> {
        self.call(store, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::model::{PersonId, Relation};

    type Rec = Relation<PersonId>;

    #[test]
    fn test_hit_returns_same_arc() {
        let memo: SnapshotMemo<u32, String> = SnapshotMemo::new(4);
        let snap = SnapshotId::next();
        let calls = Cell::new(0);

        let a = memo.get_or_compute(snap, &1, || { calls.set(calls.get() + 1); "one".into() });
        let b = memo.get_or_compute(snap, &1, || { calls.set(calls.get() + 1); "uno".into() });

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
        assert_eq!(memo.stats().hits, 1);
        assert_eq!(memo.stats().misses, 1);
    }

    #[test]
    fn test_new_snapshot_misses() {
        let memo: SnapshotMemo<u32, u32> = SnapshotMemo::new(4);
        let s1 = SnapshotId::next();
        let s2 = SnapshotId::next();
        assert_eq!(*memo.get_or_compute(s1, &1, || 10), 10);
        assert_eq!(*memo.get_or_compute(s2, &1, || 20), 20);
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let memo: SnapshotMemo<u32, u32> = SnapshotMemo::new(2);
        let s = SnapshotId::next();
        memo.get_or_compute(s, &1, || 1);
        memo.get_or_compute(s, &2, || 2);
        // touch 1 so 2 becomes the oldest
        memo.get_or_compute(s, &1, || 0);
        memo.get_or_compute(s, &3, || 3);

        assert_eq!(memo.len(), 2);
        assert!(memo.contains(s, &1));
        assert!(!memo.contains(s, &2));
        assert!(memo.contains(s, &3));
        assert_eq!(memo.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let memo: SnapshotMemo<u32, u32> = SnapshotMemo::new(0);
        let s = SnapshotId::next();
        let a = memo.get_or_compute(s, &1, || 1);
        let b = memo.get_or_compute(s, &1, || 1);
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(memo.is_empty());
        assert_eq!(memo.stats().misses, 2);
    }

    #[test]
    fn test_filter_by_id_memo_tracks_snapshots() {
        let memo = FilterByIdMemo::<Rec>::filter_by_id_with_capacity(8);
        let s1 = RelationStore::new()
            .insert(Rec::between(PersonId(1), PersonId(2)))
            .unwrap();

        let first = memo.filter_by_id(&s1, &PersonId(1));
        let again = memo.filter_by_id(&s1, &PersonId(1));
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.len(), 1);

        let s2 = s1.insert(Rec::between(PersonId(1), PersonId(3))).unwrap();
        let fresh = memo.filter_by_id(&s2, &PersonId(1));
        assert_eq!(fresh.len(), 2);
        assert!(!Arc::ptr_eq(&first, &fresh));
    }

    #[test]
    fn test_clear() {
        let memo: SnapshotMemo<u32, u32> = SnapshotMemo::new(4);
        memo.get_or_compute(SnapshotId::next(), &1, || 1);
        memo.clear();
        assert!(memo.is_empty());
        assert_eq!(memo.stats().entries, 0);
    }
}
