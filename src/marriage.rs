//! Marriage: the binary symmetric relation between two persons.
//!
//! [`MarriageBook`] is the single writer for marriages: it owns the current
//! [`MarriageStore`] snapshot and the memo cache for per-person lookups.
//! Readers take a [`snapshot`](MarriageBook::snapshot) and query it freely.

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::memo::{FilterByIdMemo, MemoStats};
use crate::model::{canonicalize_with_arity, Arity, PersonId, PropertyMap, Relation, RelationRecord};
use crate::predicate::{greater_than_equal_two, less_than_two};
use crate::store::{RelKey, RelationStore, Relations};
use crate::{Error, Result};

pub type Marriage = Relation<PersonId, PropertyMap>;
pub type MarriageStore = RelationStore<Marriage>;
pub type MarriageKey = RelKey<Marriage>;

pub const MARRIAGE_ARITY: Arity = Arity::Exactly(2);

/// Canonical key for the marriage between `a` and `b` under the default
/// [`MARRIAGE_ARITY`].
pub fn key(a: PersonId, b: PersonId) -> Result<MarriageKey> {
    canonicalize_with_arity([a, b], MARRIAGE_ARITY)
}

/// Owner of the current marriage snapshot.
#[derive(Debug)]
pub struct MarriageBook {
    store: MarriageStore,
    by_person: FilterByIdMemo<Marriage>,
    config: StoreConfig,
}

impl MarriageBook {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::from_store(MarriageStore::new(), config)
    }

    pub fn from_store(store: MarriageStore, config: StoreConfig) -> Self {
        Self {
            store,
            by_person: FilterByIdMemo::<Marriage>::filter_by_id_with_config(&config),
            config,
        }
    }

    /// The current snapshot. It stays valid after later mutations.
    pub fn snapshot(&self) -> MarriageStore {
        self.store.clone()
    }

    pub fn store(&self) -> &MarriageStore {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Canonical key for `a` and `b` under the configured arity. Every
    /// operation of the book goes through this.
    pub fn key(&self, a: PersonId, b: PersonId) -> Result<MarriageKey> {
        canonicalize_with_arity([a, b], self.config.arity)
    }

    // ========================================================================
    // Create
    // ========================================================================

    /// Record a new marriage between `a` and `b`.
    ///
    /// A record left behind by [`forget_person`](Self::forget_person) still
    /// occupies its key, so this fails with [`Error::DuplicateKey`] until
    /// [`prune_incomplete`](Self::prune_incomplete) has swept it.
    pub fn marry(&mut self, a: PersonId, b: PersonId, attributes: PropertyMap) -> Result<MarriageKey> {
        let key = self.key(a, b)?;
        let marriage = Marriage::between(a, b).with_attributes(attributes);
        self.store = self.store.insert_at(key.clone(), marriage)?;
        tracing::debug!(%key, "marriage recorded");
        Ok(key)
    }

    /// Commit a record built elsewhere. Records that do not have exactly the
    /// configured number of parties are refused.
    pub fn record(&mut self, marriage: Marriage) -> Result<MarriageKey> {
        let count = marriage.party_count();
        if !greater_than_equal_two(&marriage) || !self.config.arity.admits(count) {
            tracing::warn!(parties = count, "refusing marriage with invalid arity");
            return Err(Error::ArityViolation {
                expected: self.config.arity.to_string(),
                got: count,
            });
        }
        let key = canonicalize_with_arity(marriage.parties().copied(), self.config.arity)?;
        self.store = self.store.insert_at(key.clone(), marriage)?;
        Ok(key)
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// The marriage between `a` and `b`, if recorded. Never fails: an
    /// invalid pair simply has no marriage, and neither does a record that
    /// has lost one of the two since it was stored.
    pub fn marriage_of(&self, a: PersonId, b: PersonId) -> Option<&Marriage> {
        let key = self.key(a, b).ok()?;
        self.store
            .get(&key)
            .filter(|m| m.has_party(&a) && m.has_party(&b))
    }

    /// All marriages `person` is party to, memoized per snapshot.
    pub fn marriages_of(&self, person: PersonId) -> Arc<Relations<Marriage>> {
        self.by_person.filter_by_id(&self.store, &person)
    }

    /// Everyone `person` is married to, in ascending id order.
    pub fn spouses_of(&self, person: PersonId) -> Vec<PersonId> {
        let mut spouses: Vec<PersonId> = self
            .marriages_of(person)
            .values()
            .flat_map(|m| m.parties().copied())
            .filter(|p| *p != person)
            .collect();
        spouses.sort();
        spouses.dedup();
        spouses
    }

    pub fn cache_stats(&self) -> MemoStats {
        self.by_person.memo().stats()
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Replace the attributes of the marriage between `a` and `b`.
    pub fn amend(&mut self, a: PersonId, b: PersonId, attributes: PropertyMap) -> Result<()> {
        let key = self.key(a, b)?;
        let amended = self
            .store
            .modify_at(&key, |m| m.clone().with_attributes(attributes))
            .ok_or_else(|| Error::NotFound(format!("marriage {key}")))?;
        self.store = amended;
        Ok(())
    }

    /// Drop `person` from every marriage record they are party to, as when
    /// the person is deleted upstream. The records stay behind with fewer
    /// than two parties until [`prune_incomplete`](Self::prune_incomplete).
    pub fn forget_person(&mut self, person: PersonId) -> usize {
        let affected = self.marriages_of(person);
        for key in affected.keys() {
            if let Some(next) = self.store.modify_at(key, |m| m.clone().without_party(&person)) {
                self.store = next;
            }
        }
        affected.len()
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove the marriage between `a` and `b`. Returns whether one existed.
    pub fn divorce(&mut self, a: PersonId, b: PersonId) -> Result<bool> {
        let key = self.key(a, b)?;
        let existed = self.store.contains_key(&key);
        self.store = self.store.remove(&key);
        if existed {
            tracing::debug!(%key, "marriage removed");
        }
        Ok(existed)
    }

    /// Remove every record that has fallen below two parties.
    /// Returns the number removed.
    pub fn prune_incomplete(&mut self) -> usize {
        let before = self.store.len();
        self.store = self.store.reject(less_than_two::<Marriage>);
        let removed = before - self.store.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned incomplete marriages");
        }
        removed
    }
}

impl Default for MarriageBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{property_map, Value};

    fn p(n: u64) -> PersonId {
        PersonId(n)
    }

    #[test]
    fn test_marry_and_lookup_either_order() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), property_map([("place", "Graz")])).unwrap();

        let m = book.marriage_of(p(2), p(1)).unwrap();
        assert_eq!(m.attribute("place"), Some(&Value::from("Graz")));
        assert_eq!(book.spouses_of(p(1)), vec![p(2)]);
    }

    #[test]
    fn test_marry_twice_is_duplicate() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();
        let err = book.marry(p(2), p(1), PropertyMap::new()).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[test]
    fn test_marry_self_is_invalid() {
        let mut book = MarriageBook::new();
        let err = book.marry(p(3), p(3), PropertyMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifierSet(_)));
        assert!(book.marriage_of(p(3), p(3)).is_none());
    }

    #[test]
    fn test_record_refuses_incomplete() {
        let mut book = MarriageBook::new();
        let err = book.record(Marriage::new().with_party(p(1))).unwrap_err();
        assert!(matches!(err, Error::ArityViolation { got: 1, .. }));

        let three = Marriage::between(p(1), p(2)).with_party(p(3));
        assert!(matches!(book.record(three), Err(Error::ArityViolation { got: 3, .. })));
        assert!(book.is_empty());
    }

    #[test]
    fn test_divorce() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();
        assert!(book.divorce(p(2), p(1)).unwrap());
        assert!(!book.divorce(p(2), p(1)).unwrap());
        assert!(book.is_empty());
    }

    #[test]
    fn test_amend_missing_is_not_found() {
        let mut book = MarriageBook::new();
        let err = book.amend(p(1), p(2), PropertyMap::new()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_forget_then_prune() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();
        book.marry(p(1), p(3), PropertyMap::new()).unwrap();
        book.marry(p(4), p(5), PropertyMap::new()).unwrap();

        assert_eq!(book.forget_person(p(1)), 2);
        assert_eq!(book.len(), 3);
        assert_eq!(book.prune_incomplete(), 2);
        assert_eq!(book.len(), 1);
        assert!(book.marriage_of(p(4), p(5)).is_some());
    }

    #[test]
    fn test_forgotten_party_hides_marriage_until_pruned() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();
        book.forget_person(p(1));

        assert!(book.marriage_of(p(1), p(2)).is_none());
        assert!(matches!(
            book.marry(p(1), p(2), PropertyMap::new()),
            Err(Error::DuplicateKey(_))
        ));

        assert_eq!(book.prune_incomplete(), 1);
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();
        assert!(book.marriage_of(p(2), p(1)).is_some());
    }

    #[test]
    fn test_configured_arity_applies_to_every_operation() {
        let mut book = MarriageBook::with_config(StoreConfig::default().with_arity(Arity::Exactly(3)));

        let err = book.marry(p(1), p(2), PropertyMap::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifierSet(_)));
        assert!(matches!(
            book.record(Marriage::between(p(1), p(2))),
            Err(Error::ArityViolation { got: 2, .. })
        ));
        assert!(book.divorce(p(1), p(2)).is_err());
        assert!(book.marriage_of(p(1), p(2)).is_none());
        assert!(book.key(p(1), p(2)).is_err());
        assert!(MarriageBook::new().key(p(1), p(2)).is_ok());
    }

    #[test]
    fn test_marriages_of_is_memoized() {
        let mut book = MarriageBook::new();
        book.marry(p(1), p(2), PropertyMap::new()).unwrap();

        let a = book.marriages_of(p(1));
        let b = book.marriages_of(p(1));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(book.cache_stats().hits, 1);

        book.marry(p(1), p(3), PropertyMap::new()).unwrap();
        assert_eq!(book.marriages_of(p(1)).len(), 2);
        assert_eq!(a.len(), 1, "earlier result is untouched");
    }
}
