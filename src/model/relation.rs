//! Relation records, the payload stored under an undirected key.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::key::{canonicalize, UndirectedRelId, INLINE_PARTIES};
use super::{EntityId, PropertyMap, Value};
use crate::Result;

/// A record of the parties to a relation.
///
/// The store is generic over this trait so that a relation kind can choose
/// its own slot shape. Predicates and `filter_by_id` only need the parties.
pub trait RelationRecord {
    type Id: EntityId;

    fn parties(&self) -> impl Iterator<Item = &Self::Id>;

    fn party_count(&self) -> usize {
        self.parties().count()
    }

    fn has_party(&self, id: &Self::Id) -> bool {
        self.parties().any(|p| p == id)
    }
}

/// A relation between parties, with attributes `A`.
///
/// Parties keep insertion order and are never duplicated. The arity is not
/// enforced here: a record under construction may hold zero, one or more
/// parties than its relation kind allows.
///
/// Deserialization goes through [`with_party`](Relation::with_party), so a
/// repeated id in the input collapses to one party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRelation<Id, A>")]
pub struct Relation<Id: EntityId, A = PropertyMap> {
    parties: SmallVec<[Id; INLINE_PARTIES]>,
    pub attributes: A,
}

/// Wire shape of a [`Relation`] before party deduplication.
#[derive(Deserialize)]
struct RawRelation<Id, A> {
    parties: Vec<Id>,
    attributes: A,
}

impl<Id: EntityId, A> From<RawRelation<Id, A>> for Relation<Id, A> {
    fn from(raw: RawRelation<Id, A>) -> Self {
        raw.parties.into_iter().fold(
            Relation { parties: SmallVec::new(), attributes: raw.attributes },
            Relation::with_party,
        )
    }
}

impl<Id: EntityId, A: Default> Relation<Id, A> {
    /// An empty record with default attributes.
    pub fn new() -> Self {
        Self { parties: SmallVec::new(), attributes: A::default() }
    }

    /// A binary record between `a` and `b`.
    pub fn between(a: Id, b: Id) -> Self {
        Self::new().with_party(a).with_party(b)
    }
}

impl<Id: EntityId, A: Default> Default for Relation<Id, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: EntityId, A> Relation<Id, A> {
    pub fn with_attributes<B>(self, attributes: B) -> Relation<Id, B> {
        Relation { parties: self.parties, attributes }
    }

    /// Add a party. Adding an existing party is a no-op.
    pub fn with_party(mut self, id: Id) -> Self {
        if !self.parties.contains(&id) {
            self.parties.push(id);
        }
        self
    }

    pub fn without_party(mut self, id: &Id) -> Self {
        self.parties.retain(|p| p != id);
        self
    }

    /// Canonical key for the current parties.
    pub fn key(&self) -> Result<UndirectedRelId<Id>> {
        canonicalize(self.parties.iter().cloned())
    }
}

impl<Id: EntityId> Relation<Id, PropertyMap> {
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl<Id: EntityId, A> RelationRecord for Relation<Id, A> {
    type Id = Id;

    fn parties(&self) -> impl Iterator<Item = &Id> {
        self.parties.iter()
    }

    fn party_count(&self) -> usize {
        self.parties.len()
    }
}
