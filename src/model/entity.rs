//! Entity identifiers.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Anything that can identify an entity participating in a relation.
///
/// The store never looks inside an identifier. It needs equality and
/// hashing to key maps, and a total order to canonicalize unordered sets.
pub trait EntityId: Clone + Ord + Hash + Debug {}

impl<T: Clone + Ord + Hash + Debug> EntityId for T {}

/// Opaque person identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub u64);

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PersonId {
    fn from(v: u64) -> Self {
        PersonId(v)
    }
}
