//! `RelationStore`: one immutable snapshot of the relation mapping.

use std::fmt;
use std::sync::Arc;

use crate::model::{canonicalize, RelationRecord};
use crate::{Error, Result};
use super::{RelKey, Relations, SnapshotId};

/// An immutable snapshot of relation records keyed by undirected key.
///
/// Cloning is O(1). Mutations copy the underlying map on write and return
/// the copy as a new snapshot.
pub struct RelationStore<R: RelationRecord> {
    entries: Arc<Relations<R>>,
    snapshot: SnapshotId,
}

impl<R: RelationRecord> RelationStore<R> {
    /// An empty store.
    pub fn new() -> Self {
        Self::from_entries(Relations::<R>::new())
    }

    /// A store over an existing mapping.
    ///
    /// The caller is responsible for every key having been produced by
    /// canonicalizing its record's parties.
    pub fn from_entries(entries: Relations<R>) -> Self {
        Self { entries: Arc::new(entries), snapshot: SnapshotId::next() }
    }

    pub fn snapshot_id(&self) -> SnapshotId {
        self.snapshot
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &RelKey<R>) -> bool {
        self.entries.contains_key(key)
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// The record stored at `key`, if any.
    pub fn get(&self, key: &RelKey<R>) -> Option<&R> {
        self.entries.get(key)
    }

    /// Like [`get`](Self::get), but also returns the key as stored.
    pub fn get_with_index(&self, key: &RelKey<R>) -> Option<(&RelKey<R>, &R)> {
        self.entries.get_key_value(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RelKey<R>, &R)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RelKey<R>> {
        self.entries.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Apply `f` to a private copy of the entries and wrap it as a new snapshot.
    fn derive(&self, op: &'static str, f: impl FnOnce(&mut Relations<R>)) -> Self
    where
        R: Clone,
    {
        let mut entries = Arc::clone(&self.entries);
        f(Arc::make_mut(&mut entries));
        let next = Self { entries, snapshot: SnapshotId::next() };
        tracing::debug!(
            op,
            from = %self.snapshot,
            to = %next.snapshot,
            len = next.len(),
            "derived relation store snapshot"
        );
        next
    }
}

impl<R: RelationRecord + Clone> RelationStore<R> {
    // ========================================================================
    // Create
    // ========================================================================

    /// Add `record` at `key`. Fails with [`Error::DuplicateKey`] if the key
    /// is already occupied.
    pub fn insert_at(&self, key: RelKey<R>, record: R) -> Result<Self> {
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateKey(format!("{:?}", key.parties())));
        }
        Ok(self.derive("insert_at", |m| {
            m.insert(key, record);
        }))
    }

    /// Add or overwrite the record at `key`.
    pub fn upsert_at(&self, key: RelKey<R>, record: R) -> Self {
        self.derive("upsert_at", |m| {
            m.insert(key, record);
        })
    }

    /// [`insert_at`](Self::insert_at) under the key canonicalized from the
    /// record's own parties.
    pub fn insert(&self, record: R) -> Result<Self> {
        let key = canonicalize(record.parties().cloned())?;
        self.insert_at(key, record)
    }

    /// [`upsert_at`](Self::upsert_at) under the key canonicalized from the
    /// record's own parties. Fails only if the parties do not form a key.
    pub fn upsert(&self, record: R) -> Result<Self> {
        let key = canonicalize(record.parties().cloned())?;
        Ok(self.upsert_at(key, record))
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Every record in which `id` appears as a party.
    ///
    /// Full scan over the snapshot. Wrap with
    /// [`FilterByIdMemo`](crate::memo::FilterByIdMemo) when called repeatedly.
    pub fn filter_by_id(&self, id: &R::Id) -> Relations<R> {
        self.entries
            .iter()
            .filter(|(_, record)| record.has_party(id))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect()
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Replace the record at `key` with `f(record)`. `None` if absent.
    pub fn modify_at(&self, key: &RelKey<R>, f: impl FnOnce(&R) -> R) -> Option<Self> {
        let updated = f(self.entries.get(key)?);
        Some(self.derive("modify_at", |m| {
            m.insert(key.clone(), updated);
        }))
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove the entry at `key`. Absent keys return an equal snapshot.
    pub fn remove(&self, key: &RelKey<R>) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        self.derive("remove", |m| {
            m.remove(key);
        })
    }

    /// Remove every entry whose record satisfies `predicate`.
    pub fn reject(&self, predicate: impl Fn(&R) -> bool) -> Self {
        if !self.entries.values().any(&predicate) {
            return self.clone();
        }
        self.derive("reject", |m| m.retain(|_, record| !predicate(record)))
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl<R: RelationRecord> Clone for RelationStore<R> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), snapshot: self.snapshot }
    }
}

impl<R: RelationRecord> Default for RelationStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: two snapshots are equal when their entries are,
/// whatever their snapshot ids.
impl<R: RelationRecord + PartialEq> PartialEq for RelationStore<R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.entries == other.entries
    }
}

impl<R: RelationRecord + fmt::Debug> fmt::Debug for RelationStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationStore")
            .field("snapshot", &self.snapshot)
            .field("entries", &self.entries)
            .finish()
    }
}

impl<R: RelationRecord> FromIterator<(RelKey<R>, R)> for RelationStore<R> {
    fn from_iter<T: IntoIterator<Item = (RelKey<R>, R)>>(iter: T) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}
