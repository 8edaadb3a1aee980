//! # relstore — Persistent Store for Undirected Relations
//!
//! Records symmetric relations between entities (a marriage between two
//! persons, say) under a canonical key that does not depend on the order the
//! parties were given in.
//!
//! ## Design Principles
//!
//! 1. **Snapshots, not mutation**: every write returns a new `RelationStore`;
//!    the old one stays valid and unchanged
//! 2. **Canonical keys**: `canonicalize(a, b) == canonicalize(b, a)`, and
//!    distinct party sets never share a key
//! 3. **Arity lives outside the store**: the store is a plain keyed container;
//!    `predicate` holds the party-count rules callers apply
//! 4. **Memoize by snapshot identity**: cached queries never need manual
//!    invalidation because a mutated store has a new `SnapshotId`
//!
//! ## Quick Start
//!
//! ```rust
//! use relstore::{canonicalize_pair, PersonId, Relation, RelationStore};
//!
//! # fn example() -> relstore::Result<()> {
//! let (p1, p2) = (PersonId(1), PersonId(2));
//! let key = canonicalize_pair(p1, p2)?;
//!
//! let empty: RelationStore<Relation<PersonId>> = RelationStore::new();
//! let married = empty.insert_at(key.clone(), Relation::between(p1, p2))?;
//! assert_eq!(married.filter_by_id(&p1).len(), 1);
//!
//! let divorced = married.remove(&canonicalize_pair(p2, p1)?);
//! assert!(divorced.get(&key).is_none());
//! assert_eq!(married.len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod store;
pub mod predicate;
pub mod memo;
pub mod config;
pub mod marriage;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    EntityId, PersonId, UndirectedRelId, Arity,
    Relation, RelationRecord, Value, PropertyMap,
    canonicalize, canonicalize_pair, canonicalize_with_arity,
};

// ============================================================================
// Re-exports: Store, predicates and memoization
// ============================================================================

pub use store::{RelationStore, RelKey, Relations, SnapshotId};
pub use predicate::{greater_than_equal_two, less_than_two};
pub use memo::{FilterByIdMemo, MemoizedQuery, MemoStats, SnapshotMemo};
pub use config::StoreConfig;
pub use marriage::{Marriage, MarriageBook, MarriageStore};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate key: a relation is already stored at {0}")]
    DuplicateKey(String),

    #[error("Invalid identifier set: {0}")]
    InvalidIdentifierSet(String),

    #[error("Arity violation: expected {expected} parties, got {got}")]
    ArityViolation { expected: String, got: usize },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
