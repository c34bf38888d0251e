//! Typed attribute identifiers
//!
//! A [`Key<T>`] names one attribute and fixes the Rust type it is read as.
//! [`SetKey<T>`] is the set-valued variant used to attach the matches of a
//! one-to-many join to the held record.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::record::{Attribute, Record, Value};

/// Conversion between a Rust type and an attribute [`Value`]
pub trait FieldType: Sized {
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldType for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FieldType for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FieldType for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FieldType for Record {
    fn into_value(self) -> Value {
        Value::Record(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Record(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(FieldType::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FieldType + Ord> FieldType for BTreeSet<T> {
    fn into_value(self) -> Value {
        Value::Set(self.into_iter().map(FieldType::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Set(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// Named, typed attribute identifier
///
/// Equality and hashing look at the name only, so two keys with the same
/// name address the same attribute.
pub struct Key<T> {
    name: Arc<str>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: FieldType> Key<T> {
    /// Attribute holding `value` under this key
    pub fn of(&self, value: T) -> Attribute {
        Attribute::new(self.name.to_string(), value.into_value())
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            _type: PhantomData,
        }
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Key whose value is a set of `T`
pub struct SetKey<T> {
    key: Key<BTreeSet<T>>,
}

impl<T: FieldType + Ord> SetKey<T> {
    pub fn new(name: &str) -> Self {
        Self { key: Key::new(name) }
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Underlying typed key, for reading the set back out of a record
    pub fn as_key(&self) -> &Key<BTreeSet<T>> {
        &self.key
    }

    /// Package any collection of `T` as this set-valued attribute
    ///
    /// Duplicate items collapse.
    pub fn of<I>(&self, items: I) -> Attribute
    where
        I: IntoIterator<Item = T>,
    {
        self.key.of(items.into_iter().collect())
    }
}

impl<T> Clone for SetKey<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
        }
    }
}

impl<T> fmt::Debug for SetKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SetKey({})", self.key.name)
    }
}
