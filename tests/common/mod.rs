//! Shared fixtures for join integration tests

#![allow(dead_code)]

use record_join::{Index, JoinKey, Key, Record, RecordJoiner, SetKey};

pub fn id() -> Key<i64> {
    Key::new("id")
}

pub fn name() -> Key<String> {
    Key::new("name")
}

pub fn parent_id() -> Key<i64> {
    Key::new("parent_id")
}

pub fn item() -> Key<String> {
    Key::new("item")
}

pub fn items() -> SetKey<Record> {
    SetKey::new("items")
}

/// Held-side record: `{id, name}`
pub fn person(person_id: i64, person_name: &str) -> Record {
    Record::from_attributes([id().of(person_id), name().of(person_name.to_string())])
}

/// Incoming-side record: `{parent_id, item}`
pub fn belonging(owner: i64, what: &str) -> Record {
    Record::from_attributes([parent_id().of(owner), item().of(what.to_string())])
}

/// `{1: Alice, 2: Bob}` keyed by `id`
pub fn people() -> Index<i64> {
    id().index(vec![person(1, "Alice"), person(2, "Bob")])
        .expect("people are keyed by id")
}

/// `[pen -> 1, cup -> 1, hat -> 3]`
pub fn belongings() -> Vec<Record> {
    vec![belonging(1, "pen"), belonging(1, "cup"), belonging(3, "hat")]
}

pub fn people_joiner() -> RecordJoiner<i64, Key<i64>> {
    RecordJoiner::new(people(), parent_id())
}
