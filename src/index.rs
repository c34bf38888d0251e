//! Keyed record index and the multiplicity-constrained join primitives
//!
//! An [`Index`] groups records by join key while remembering insertion order.
//! It is built once (see [`crate::JoinKey::index`]) and never changes after
//! that. Duplicate keys are kept, because the join primitives differ
//! precisely in how they treat duplicate or missing keys:
//!
//! | primitive | iterates | emits |
//! |---|---|---|
//! | `many_to_one` | incoming records | `(incoming, held)` when exactly one held match |
//! | `strict_many_to_one` | incoming records | as above, fails on 0 or >1 held matches |
//! | `one_to_many` | held keys | `(held, matches)`, matches may be empty |
//! | `strict_one_to_many` | held keys | as above, fails on empty matches or duplicate held keys |
//! | `strict_one_to_one` | held keys | `(held, incoming)`, fails unless bijective |
//!
//! In every primitive `self` is the held side and the argument is the
//! incoming side. Strict primitives collect every offending key before
//! failing and never return partial output.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use tracing::{debug, warn};

use crate::error::{
    ensure_no_violations, JoinError, JoinOperation, KeyViolation, Side, ViolationKind,
};
use crate::pair::Pair;
use crate::record::Record;

/// Requirements on a join key type
pub trait IndexKey: Ord + Hash + Clone + fmt::Debug + Send + Sync {}

impl<T> IndexKey for T where T: Ord + Hash + Clone + fmt::Debug + Send + Sync {}

/// Records grouped by key, in insertion order
#[derive(Debug, Clone)]
pub struct Index<K> {
    /// Every record with its key, in the order it was added
    entries: Vec<(K, Record)>,
    /// key -> records carrying it, in insertion order
    groups: FxHashMap<K, Vec<Record>>,
}

impl<K: IndexKey> Default for Index<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            groups: FxHashMap::default(),
        }
    }
}

impl<K: IndexKey> Index<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            groups: FxHashMap::default(),
        }
    }

    pub(crate) fn push(&mut self, key: K, record: Record) {
        self.groups
            .entry(key.clone())
            .or_default()
            .push(record.clone());
        self.entries.push((key, record));
    }

    /// Distinct keys present in the index
    pub fn keys(&self) -> BTreeSet<K> {
        self.groups.keys().cloned().collect()
    }

    /// Records carrying `key`, in insertion order
    pub fn get(&self, key: &K) -> &[Record] {
        self.groups.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.groups.contains_key(key)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, record)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Record)> {
        self.entries.iter().map(|(key, record)| (key, record))
    }

    /// Lenient many-to-one
    ///
    /// One `(incoming, held)` pair per incoming record whose key has exactly
    /// one held record. Incoming records with no held match are dropped, and
    /// so are those whose key is ambiguous on the held side.
    pub fn many_to_one(&self, incoming: &Index<K>) -> Vec<Pair<Record, Record>> {
        let mut ambiguous: FxHashSet<&K> = FxHashSet::default();
        let pairs: Vec<_> = incoming
            .entries
            .iter()
            .filter_map(|(key, record)| match self.get(key) {
                [held] => Some(Pair::new(record.clone(), held.clone())),
                [] => None,
                held => {
                    if ambiguous.insert(key) {
                        warn!(
                            key = ?key,
                            held = held.len(),
                            "ambiguous held key in many_to_one, dropping incoming records"
                        );
                    }
                    None
                }
            })
            .collect();

        debug!(
            incoming = incoming.len(),
            matched = pairs.len(),
            ambiguous = ambiguous.len(),
            "many_to_one paired"
        );
        pairs
    }

    /// Strict many-to-one
    ///
    /// Every incoming key must have exactly one held record.
    pub fn strict_many_to_one(
        &self,
        incoming: &Index<K>,
    ) -> Result<Vec<Pair<Record, Record>>, JoinError> {
        let mut pairs = Vec::with_capacity(incoming.len());
        let mut violations = Vec::new();
        let mut reported: FxHashSet<&K> = FxHashSet::default();

        for (key, record) in &incoming.entries {
            match self.get(key) {
                [held] => pairs.push(Pair::new(record.clone(), held.clone())),
                held => {
                    if !reported.insert(key) {
                        continue;
                    }
                    let kind = if held.is_empty() {
                        ViolationKind::Missing { side: Side::Held }
                    } else {
                        ViolationKind::Duplicate {
                            side: Side::Held,
                            count: held.len(),
                        }
                    };
                    violations.push(KeyViolation::new(
                        key,
                        kind,
                        held.len(),
                        incoming.get(key).len(),
                    ));
                }
            }
        }

        report(JoinOperation::StrictManyToOne, &violations);
        ensure_no_violations(JoinOperation::StrictManyToOne, violations)?;
        Ok(pairs)
    }

    /// Lenient one-to-many
    ///
    /// One `(held, matches)` pair per distinct held key, in first-seen order;
    /// `matches` is every incoming record sharing the key and may be empty.
    /// A key held more than once is represented by its first held record.
    pub fn one_to_many(&self, incoming: &Index<K>) -> Vec<Pair<Record, Vec<Record>>> {
        let mut seen: FxHashSet<&K> = FxHashSet::default();
        let mut pairs = Vec::with_capacity(self.key_count());

        for (key, held) in &self.entries {
            if !seen.insert(key) {
                continue;
            }
            let count = self.get(key).len();
            if count > 1 {
                warn!(
                    key = ?key,
                    held = count,
                    "duplicate held key in one_to_many, keeping first record"
                );
            }
            pairs.push(Pair::new(held.clone(), incoming.get(key).to_vec()));
        }

        debug!(
            held_keys = pairs.len(),
            incoming = incoming.len(),
            "one_to_many paired"
        );
        pairs
    }

    /// Strict one-to-many
    ///
    /// Every held key must appear exactly once on the held side and have at
    /// least one incoming record. An unmatched key is reported as missing even
    /// when it is also duplicated.
    pub fn strict_one_to_many(
        &self,
        incoming: &Index<K>,
    ) -> Result<Vec<Pair<Record, Vec<Record>>>, JoinError> {
        let mut pairs = Vec::with_capacity(self.key_count());
        let mut violations = Vec::new();
        let mut seen: FxHashSet<&K> = FxHashSet::default();

        for (key, held) in &self.entries {
            if !seen.insert(key) {
                continue;
            }
            let held_count = self.get(key).len();
            let matches = incoming.get(key);
            let kind = if matches.is_empty() {
                Some(ViolationKind::Missing {
                    side: Side::Incoming,
                })
            } else if held_count > 1 {
                Some(ViolationKind::Duplicate {
                    side: Side::Held,
                    count: held_count,
                })
            } else {
                None
            };
            match kind {
                None => pairs.push(Pair::new(held.clone(), matches.to_vec())),
                Some(kind) => {
                    violations.push(KeyViolation::new(key, kind, held_count, matches.len()))
                }
            }
        }

        report(JoinOperation::StrictOneToMany, &violations);
        ensure_no_violations(JoinOperation::StrictOneToMany, violations)?;
        Ok(pairs)
    }

    /// Strict one-to-one
    ///
    /// Every key on either side must appear exactly once on each side.
    /// Violations are listed for held keys in held order, then for
    /// incoming-only keys in incoming order.
    pub fn strict_one_to_one(
        &self,
        incoming: &Index<K>,
    ) -> Result<Vec<Pair<Record, Record>>, JoinError> {
        let mut pairs = Vec::with_capacity(self.key_count());
        let mut violations = Vec::new();
        let mut seen: FxHashSet<&K> = FxHashSet::default();

        for (key, held) in &self.entries {
            if !seen.insert(key) {
                continue;
            }
            let held_count = self.get(key).len();
            let matches = incoming.get(key);
            match ViolationKind::one_to_one(held_count, matches.len()) {
                None => pairs.push(Pair::new(held.clone(), matches[0].clone())),
                Some(kind) => {
                    violations.push(KeyViolation::new(key, kind, held_count, matches.len()))
                }
            }
        }

        for (key, _) in &incoming.entries {
            if !seen.insert(key) {
                continue;
            }
            // every held key was visited above, so this one is incoming-only
            let incoming_count = incoming.get(key).len();
            violations.push(KeyViolation::new(
                key,
                ViolationKind::Missing { side: Side::Held },
                0,
                incoming_count,
            ));
        }

        report(JoinOperation::StrictOneToOne, &violations);
        ensure_no_violations(JoinOperation::StrictOneToOne, violations)?;
        Ok(pairs)
    }
}

impl<K: IndexKey> FromIterator<(K, Record)> for Index<K> {
    fn from_iter<I: IntoIterator<Item = (K, Record)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut index = Index::with_capacity(iter.size_hint().0);
        for (key, record) in iter {
            index.push(key, record);
        }
        index
    }
}

fn report(operation: JoinOperation, violations: &[KeyViolation]) {
    if let Some(first) = violations.first() {
        debug!(
            %operation,
            violations = violations.len(),
            first = %first,
            "strict join contract violated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Attribute;

    fn rec(tag: &str) -> Record {
        Record::from_attributes([Attribute::new("tag", tag)])
    }

    fn index(entries: &[(i64, &str)]) -> Index<i64> {
        entries.iter().map(|(k, tag)| (*k, rec(tag))).collect()
    }

    fn tags(pairs: &[Pair<Record, Record>]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|p| (p.first().to_json(), p.second().to_json()))
            .collect()
    }

    #[test]
    fn test_index_keeps_duplicates_and_order() {
        let idx = index(&[(2, "b"), (1, "a"), (2, "c")]);

        assert_eq!(idx.len(), 3);
        assert_eq!(idx.key_count(), 2);
        assert_eq!(idx.keys(), BTreeSet::from([1, 2]));
        assert_eq!(idx.get(&2), &[rec("b"), rec("c")]);
        assert!(idx.get(&7).is_empty());
        assert!(!idx.contains_key(&7));

        let order: Vec<_> = idx.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![2, 1, 2]);
    }

    #[test]
    fn test_many_to_one_drops_missing_and_ambiguous() {
        let held = index(&[(1, "h1"), (2, "h2a"), (2, "h2b")]);
        let incoming = index(&[(1, "i1"), (2, "i2"), (3, "i3"), (1, "i1b")]);

        let pairs = held.many_to_one(&incoming);

        assert_eq!(
            tags(&pairs),
            vec![
                (rec("i1").to_json(), rec("h1").to_json()),
                (rec("i1b").to_json(), rec("h1").to_json()),
            ]
        );
    }

    #[test]
    fn test_strict_many_to_one_reports_each_key_once() {
        let held = index(&[(1, "h1"), (2, "h2a"), (2, "h2b")]);
        let incoming = index(&[(3, "i3"), (2, "i2"), (3, "i3b"), (1, "i1")]);

        let err = held.strict_many_to_one(&incoming).unwrap_err();
        let violations = err.violations();

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].key, "3");
        assert_eq!(violations[0].kind, ViolationKind::Missing { side: Side::Held });
        assert_eq!(violations[0].incoming, 2);
        assert_eq!(violations[1].key, "2");
        assert_eq!(
            violations[1].kind,
            ViolationKind::Duplicate {
                side: Side::Held,
                count: 2
            }
        );
    }

    #[test]
    fn test_strict_many_to_one_matches_lenient_when_clean() {
        let held = index(&[(1, "h1"), (2, "h2")]);
        let incoming = index(&[(2, "i2"), (1, "i1"), (2, "i2b")]);

        assert_eq!(
            held.strict_many_to_one(&incoming).unwrap(),
            held.many_to_one(&incoming)
        );
    }

    #[test]
    fn test_one_to_many_emits_empty_groups() {
        let held = index(&[(1, "h1"), (2, "h2")]);
        let incoming = index(&[(1, "a"), (1, "b"), (9, "z")]);

        let pairs = held.one_to_many(&incoming);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].first(), &rec("h1"));
        assert_eq!(pairs[0].second(), &vec![rec("a"), rec("b")]);
        assert_eq!(pairs[1].first(), &rec("h2"));
        assert!(pairs[1].second().is_empty());
    }

    #[test]
    fn test_strict_one_to_many_fails_on_unmatched_held_key() {
        let held = index(&[(1, "h1"), (2, "h2")]);
        let incoming = index(&[(1, "a")]);

        let err = held.strict_one_to_many(&incoming).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].key, "2");
        assert!(matches!(
            err,
            JoinError::Cardinality {
                operation: JoinOperation::StrictOneToMany,
                ..
            }
        ));
    }

    #[test]
    fn test_one_to_many_emits_once_per_held_key() {
        let held = index(&[(1, "alice"), (2, "bob"), (1, "alicia")]);
        let incoming = index(&[(1, "pen"), (2, "cup"), (1, "hat")]);

        let pairs = held.one_to_many(&incoming);

        assert_eq!(pairs.len(), held.key_count());
        assert_eq!(pairs[0].first(), &rec("alice"));
        assert_eq!(pairs[0].second(), &vec![rec("pen"), rec("hat")]);
        assert_eq!(pairs[1].first(), &rec("bob"));
        assert_eq!(pairs[1].second(), &vec![rec("cup")]);
    }

    #[test]
    fn test_strict_one_to_many_rejects_duplicate_held_key() {
        let held = index(&[(1, "alice"), (1, "alicia"), (2, "bob"), (3, "carol"), (3, "cleo")]);
        let incoming = index(&[(1, "pen"), (2, "cup")]);

        let err = held.strict_one_to_many(&incoming).unwrap_err();
        let kinds: Vec<_> = err
            .violations()
            .iter()
            .map(|v| (v.key.as_str(), v.kind))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (
                    "1",
                    ViolationKind::Duplicate {
                        side: Side::Held,
                        count: 2
                    }
                ),
                (
                    "3",
                    ViolationKind::Missing {
                        side: Side::Incoming
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_strict_one_to_one_pairs_held_first() {
        let held = index(&[(1, "h1"), (2, "h2")]);
        let incoming = index(&[(2, "i2"), (1, "i1")]);

        let pairs = held.strict_one_to_one(&incoming).unwrap();
        assert_eq!(
            tags(&pairs),
            vec![
                (rec("h1").to_json(), rec("i1").to_json()),
                (rec("h2").to_json(), rec("i2").to_json()),
            ]
        );
    }

    #[test]
    fn test_strict_one_to_one_collects_all_violations() {
        let held = index(&[(1, "h1"), (2, "h2a"), (2, "h2b"), (3, "h3"), (4, "h4")]);
        let incoming = index(&[(1, "i1"), (2, "i2"), (4, "i4a"), (4, "i4b"), (5, "i5")]);

        let err = held.strict_one_to_one(&incoming).unwrap_err();
        let kinds: Vec<_> = err
            .violations()
            .iter()
            .map(|v| (v.key.as_str(), v.kind))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (
                    "2",
                    ViolationKind::Duplicate {
                        side: Side::Held,
                        count: 2
                    }
                ),
                (
                    "3",
                    ViolationKind::Missing {
                        side: Side::Incoming
                    }
                ),
                (
                    "4",
                    ViolationKind::Duplicate {
                        side: Side::Incoming,
                        count: 2
                    }
                ),
                ("5", ViolationKind::Missing { side: Side::Held }),
            ]
        );
    }

    #[test]
    fn test_strict_one_to_one_both_sides_duplicate() {
        let held = index(&[(7, "a"), (7, "b")]);
        let incoming = index(&[(7, "c"), (7, "d"), (7, "e")]);

        let err = held.strict_one_to_one(&incoming).unwrap_err();
        assert_eq!(
            err.violations()[0].kind,
            ViolationKind::DuplicateBothSides {
                held: 2,
                incoming: 3
            }
        );
    }

    #[test]
    fn test_empty_indices() {
        let empty: Index<i64> = Index::new();
        let held = index(&[(1, "h1")]);

        assert!(held.many_to_one(&empty).is_empty());
        assert!(empty.one_to_many(&held).is_empty());
        assert!(empty.strict_one_to_one(&empty).unwrap().is_empty());
        assert!(empty.strict_one_to_many(&held).unwrap().is_empty());
        assert!(held.strict_one_to_many(&empty).is_err());
    }
}
