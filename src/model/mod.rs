//! # Relation Model
//!
//! Plain data for undirected relations: entity identifiers, canonical keys,
//! relation records and their attribute values.
//!
//! This module is pure data: no I/O, no shared state.

pub mod entity;
pub mod key;
pub mod relation;
pub mod value;
pub mod property_map;

pub use entity::{EntityId, PersonId};
pub use key::{
    Arity, UndirectedRelId,
    canonicalize, canonicalize_pair, canonicalize_with_arity,
};
pub use relation::{Relation, RelationRecord};
pub use value::Value;
pub use property_map::{PropertyMap, property_map};
