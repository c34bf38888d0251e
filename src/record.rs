//! Immutable attribute records
//!
//! A [`Record`] is a persistent mapping from attribute name to [`Value`].
//! Records are shared through an `Arc`, so cloning one is a pointer bump;
//! every "modification" ([`Record::with`], [`Record::with_attribute`])
//! allocates a new record and leaves its inputs untouched.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::key::{FieldType, Key};

/// Attribute value
///
/// Totally ordered and hashable so that records can live inside sets and
/// be used as join keys themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Record(Record),
    List(Vec<Value>),
    Set(BTreeSet<Value>),
}

impl Value {
    /// Type name used in key-extraction diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// A single named value, as produced by [`Key::of`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: Value,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}

/// Immutable attribute record
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    attributes: Arc<BTreeMap<String, Value>>,
}

impl Record {
    /// Record with no attributes
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a record from attributes; later attributes win on name collision
    pub fn from_attributes<I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = Attribute>,
    {
        let attributes = attributes.into_iter().map(Attribute::into_parts).collect();
        Self {
            attributes: Arc::new(attributes),
        }
    }

    /// Typed attribute lookup
    ///
    /// Returns `None` when the attribute is absent or holds a value of a
    /// different type than the key declares.
    pub fn get<T: FieldType>(&self, key: &Key<T>) -> Option<T> {
        self.get_value(key.name()).and_then(T::from_value)
    }

    /// Untyped attribute lookup
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes in name order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Structural merge
    ///
    /// The result holds the union of both attribute sets; `other` wins where
    /// both records define the same attribute. `r.with(&r) == r`.
    pub fn with(&self, other: &Record) -> Record {
        if other.is_empty() || Arc::ptr_eq(&self.attributes, &other.attributes) {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut merged = BTreeMap::clone(&self.attributes);
        merged.extend(
            other
                .attributes
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        Record {
            attributes: Arc::new(merged),
        }
    }

    /// Copy of this record with one attribute added or replaced
    pub fn with_attribute(&self, attribute: Attribute) -> Record {
        let (name, value) = attribute.into_parts();
        let mut attributes = BTreeMap::clone(&self.attributes);
        attributes.insert(name, value);
        Record {
            attributes: Arc::new(attributes),
        }
    }

    /// Compact JSON rendering
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unrenderable record: {}>", e))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.attributes.iter())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.attributes.iter()).finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl From<Attribute> for Record {
    fn from(attribute: Attribute) -> Self {
        Record::from_attributes([attribute])
    }
}

impl FromIterator<Attribute> for Record {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Record::from_attributes(iter)
    }
}
