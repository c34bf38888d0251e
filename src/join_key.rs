//! Join key extraction
//!
//! A [`JoinKey`] pulls a key out of a record and groups a record sequence
//! into an [`Index`] by that key. Grouping keeps every record, duplicates
//! included; cardinality is only enforced by the join primitives.

use crate::error::JoinError;
use crate::index::{Index, IndexKey};
use crate::key::{FieldType, Key};
use crate::record::Record;

/// Key extraction rule
pub trait JoinKey<K: IndexKey>: Send + Sync {
    /// Extract the join key from `record`
    ///
    /// Must be deterministic. A record that cannot produce a key is a data
    /// error and aborts the join.
    fn extract(&self, record: &Record) -> Result<K, JoinError>;

    /// Group `records` by extracted key
    ///
    /// Consumes the sequence once and stops at the first extraction failure.
    fn index<I>(&self, records: I) -> Result<Index<K>, JoinError>
    where
        I: IntoIterator<Item = Record>,
        Self: Sized,
    {
        let records = records.into_iter();
        let mut index = Index::with_capacity(records.size_hint().0);
        for record in records {
            let key = self.extract(&record)?;
            index.push(key, record);
        }
        Ok(index)
    }
}

/// An attribute key is a join key on that attribute
impl<T> JoinKey<T> for Key<T>
where
    T: FieldType + IndexKey,
{
    fn extract(&self, record: &Record) -> Result<T, JoinError> {
        let value = record.get_value(self.name()).ok_or_else(|| JoinError::KeyExtraction {
            key: self.name().to_string(),
            detail: format!("attribute missing from {}", record),
        })?;
        T::from_value(value).ok_or_else(|| JoinError::KeyExtraction {
            key: self.name().to_string(),
            detail: format!("unexpected {} value in {}", value.type_name(), record),
        })
    }
}

/// Join key computed by a closure; see [`from_fn`]
pub struct FnJoinKey<F> {
    name: String,
    extract: F,
}

/// Join key from a closure returning `None` for records without a key
///
/// `name` is only used in error messages.
pub fn from_fn<K, F>(name: impl Into<String>, extract: F) -> FnJoinKey<F>
where
    F: Fn(&Record) -> Option<K> + Send + Sync,
{
    FnJoinKey {
        name: name.into(),
        extract,
    }
}

impl<K, F> JoinKey<K> for FnJoinKey<F>
where
    K: IndexKey,
    F: Fn(&Record) -> Option<K> + Send + Sync,
{
    fn extract(&self, record: &Record) -> Result<K, JoinError> {
        (self.extract)(record).ok_or_else(|| JoinError::KeyExtraction {
            key: self.name.clone(),
            detail: format!("no key for {}", record),
        })
    }
}
