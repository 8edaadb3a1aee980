//! # Relation Store
//!
//! A persistent mapping from [`UndirectedRelId`] to relation records.
//!
//! Every mutating operation returns a new [`RelationStore`] snapshot and
//! leaves the receiver untouched. Snapshots share their contents through an
//! `Arc`, so holding on to an old snapshot is cheap and it stays valid
//! after later mutations.
//!
//! ## Snapshot identity
//!
//! Each snapshot carries a [`SnapshotId`]. A mutation that changes the
//! contents always yields a fresh id; one that changes nothing (removing an
//! absent key, rejecting with no match) hands back the same id. Caches keyed
//! by snapshot id therefore never need manual invalidation.
//!
//! ## Arity
//!
//! The store does not check how many parties a record has. Use the
//! predicates in [`crate::predicate`] before committing a record, or with
//! [`RelationStore::reject`] to clear out records that lost a party.

pub mod snapshot;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;

use crate::model::{RelationRecord, UndirectedRelId};

pub use snapshot::RelationStore;

/// Key type of a store holding records of type `R`.
pub type RelKey<R> = UndirectedRelId<<R as RelationRecord>::Id>;

/// Result of a multi-record query such as `filter_by_id`.
pub type Relations<R> = HashMap<RelKey<R>, R>;

static NEXT_SNAPSHOT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one store snapshot.
///
/// Ids are process-unique and never reused, so two snapshots with the same
/// id always have the same contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    pub(crate) fn next() -> Self {
        SnapshotId(NEXT_SNAPSHOT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}
