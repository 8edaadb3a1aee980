//! Arity predicates over relation records.
//!
//! The store never enforces arity. Callers check records with these before
//! committing them, and pass them to [`RelationStore::reject`] to sweep out
//! records that dropped below their relation's arity.
//!
//! [`RelationStore::reject`]: crate::store::RelationStore::reject

use crate::model::{Arity, RelationRecord};

/// True when the record has two or more parties.
pub fn greater_than_equal_two<R: RelationRecord>(record: &R) -> bool {
    record.party_count() >= 2
}

/// True when the record has fewer than two parties.
pub fn less_than_two<R: RelationRecord>(record: &R) -> bool {
    record.party_count() < 2
}

/// Predicate holding for records whose party count `arity` admits.
pub fn satisfies<R: RelationRecord>(arity: Arity) -> impl Fn(&R) -> bool {
    move |record: &R| arity.admits(record.party_count())
}

/// Complement of [`satisfies`].
pub fn violates<R: RelationRecord>(arity: Arity) -> impl Fn(&R) -> bool {
    move |record: &R| !arity.admits(record.party_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PersonId, Relation};

    type Rec = Relation<PersonId>;

    #[test]
    fn test_two_party_thresholds() {
        let empty = Rec::new();
        let one = Rec::new().with_party(PersonId(1));
        let two = Rec::between(PersonId(1), PersonId(2));
        let three = two.clone().with_party(PersonId(3));

        assert!(less_than_two(&empty));
        assert!(less_than_two(&one));
        assert!(greater_than_equal_two(&two));
        assert!(greater_than_equal_two(&three));
    }

    #[test]
    fn test_exact_arity() {
        let pair = satisfies::<Rec>(Arity::Exactly(2));
        let three = Rec::between(PersonId(1), PersonId(2)).with_party(PersonId(3));
        assert!(pair(&Rec::between(PersonId(1), PersonId(2))));
        assert!(!pair(&three));
        assert!(violates::<Rec>(Arity::Exactly(2))(&three));
    }
}
