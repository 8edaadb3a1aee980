//! Undirected relation keys and canonicalization.
//!
//! A key is the sorted list of the relation's parties. Sorting gives the
//! same key for every permutation of the input, and keeping the full list
//! (rather than a hash of it) makes distinct party sets map to distinct keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::EntityId;
use crate::{Error, Result};

/// Inline capacity for party lists. Binary relations never spill to the heap.
pub(crate) const INLINE_PARTIES: usize = 2;

/// Canonical, order-independent key for an undirected relation.
///
/// Only constructed through [`canonicalize`] and friends, so the parties are
/// always sorted and pairwise distinct, and there are at least two of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UndirectedRelId<Id: EntityId> {
    parties: SmallVec<[Id; INLINE_PARTIES]>,
}

impl<Id: EntityId> UndirectedRelId<Id> {
    /// Parties in canonical (ascending) order.
    pub fn parties(&self) -> &[Id] {
        &self.parties
    }

    pub fn arity(&self) -> usize {
        self.parties.len()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.parties.binary_search(id).is_ok()
    }

    /// For a binary key, the party that is not `id`.
    pub fn other(&self, id: &Id) -> Option<&Id> {
        match self.parties.as_slice() {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }
}

impl<Id: EntityId + fmt::Display> fmt::Display for UndirectedRelId<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.parties.iter().enumerate() {
            if i > 0 { write!(f, "~")?; }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Arity
// ============================================================================

/// Required number of parties for a relation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum Arity {
    /// Exactly `n` parties (a marriage is `Exactly(2)`).
    Exactly(usize),
    /// At least `n` parties.
    AtLeast(usize),
}

impl Arity {
    pub fn admits(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::Exactly(2)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

// ============================================================================
// Canonicalization
// ============================================================================

/// Map an unordered set of identifiers to its canonical key.
///
/// Fails with [`Error::InvalidIdentifierSet`] when fewer than two ids are
/// given or when any id repeats: an entity cannot be related to itself.
pub fn canonicalize<Id, I>(ids: I) -> Result<UndirectedRelId<Id>>
where
    Id: EntityId,
    I: IntoIterator<Item = Id>,
{
    let mut parties: SmallVec<[Id; INLINE_PARTIES]> = ids.into_iter().collect();
    if parties.len() < 2 {
        return Err(Error::InvalidIdentifierSet(format!(
            "an undirected relation needs at least 2 parties, got {}",
            parties.len()
        )));
    }

    parties.sort_unstable();
    if let Some(dup) = parties.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::InvalidIdentifierSet(format!(
            "party {:?} appears more than once",
            dup[0]
        )));
    }

    Ok(UndirectedRelId { parties })
}

/// Binary form of [`canonicalize`]: order the two ids, then pair them.
pub fn canonicalize_pair<Id: EntityId>(a: Id, b: Id) -> Result<UndirectedRelId<Id>> {
    canonicalize([a, b])
}

/// [`canonicalize`], additionally checking the id count against `arity`.
pub fn canonicalize_with_arity<Id, I>(ids: I, arity: Arity) -> Result<UndirectedRelId<Id>>
where
    Id: EntityId,
    I: IntoIterator<Item = Id>,
{
    let key = canonicalize(ids)?;
    if !arity.admits(key.arity()) {
        return Err(Error::InvalidIdentifierSet(format!(
            "relation requires {arity} parties, got {}",
            key.arity()
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersonId;

    #[test]
    fn test_pair_is_order_independent() {
        let ab = canonicalize_pair(PersonId(1), PersonId(2)).unwrap();
        let ba = canonicalize_pair(PersonId(2), PersonId(1)).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.parties(), &[PersonId(1), PersonId(2)]);
    }

    #[test]
    fn test_nary_permutations_agree() {
        let k1 = canonicalize(["c", "a", "b"]).unwrap();
        let k2 = canonicalize(["b", "c", "a"]).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(k1.arity(), 3);
    }

    #[test]
    fn test_self_relation_rejected() {
        let err = canonicalize_pair(PersonId(7), PersonId(7)).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifierSet(_)));
    }

    #[test]
    fn test_too_few_parties_rejected() {
        assert!(canonicalize(Vec::<u32>::new()).is_err());
        assert!(canonicalize([1u32]).is_err());
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        assert!(canonicalize_with_arity([1, 2, 3], Arity::Exactly(2)).is_err());
        assert!(canonicalize_with_arity([1, 2, 3], Arity::AtLeast(2)).is_ok());
    }

    #[test]
    fn test_other_party() {
        let key = canonicalize_pair(PersonId(4), PersonId(9)).unwrap();
        assert_eq!(key.other(&PersonId(4)), Some(&PersonId(9)));
        assert_eq!(key.other(&PersonId(9)), Some(&PersonId(4)));
        assert_eq!(key.other(&PersonId(5)), None);
        assert!(key.contains(&PersonId(9)));
    }

    #[test]
    fn test_display() {
        let key = canonicalize_pair(PersonId(2), PersonId(1)).unwrap();
        assert_eq!(key.to_string(), "1~2");
    }
}
