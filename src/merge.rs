//! Pair merge functions used by [`crate::RecordJoiner`]

use crate::key::SetKey;
use crate::pair::Pair;
use crate::record::Record;

/// `first.with(second)`: the second record's attributes win
///
/// Many-to-one pairs are `(incoming, held)` and one-to-one pairs are
/// `(held, incoming)`.
pub fn merge_one(pair: Pair<Record, Record>) -> Record {
    let (first, second) = pair.into_parts();
    first.with(&second)
}

/// Attach the matches of a `(held, matches)` pair under `many_key`
pub fn merge_many(
    many_key: &SetKey<Record>,
) -> impl Fn(Pair<Record, Vec<Record>>) -> Record + Send + Sync + '_ {
    move |pair| {
        let (held, matches) = pair.into_parts();
        held.with_attribute(many_key.of(matches))
    }
}
