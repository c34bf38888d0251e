//! record-join - In-memory indexed join engine for immutable attribute records
//!
//! Combines two collections of [`Record`]s on a shared key under a declared
//! cardinality contract (many-to-one, one-to-many, strict one-to-one) and
//! produces freshly merged records without touching either input.
//!
//! ```
//! use record_join::{JoinKey, Key, Record, RecordJoiner, SetKey};
//!
//! let id: Key<i64> = Key::new("id");
//! let name: Key<String> = Key::new("name");
//! let parent_id: Key<i64> = Key::new("parent_id");
//!
//! let people = id
//!     .index(vec![Record::from_attributes([id.of(1), name.of("Alice".into())])])
//!     .unwrap();
//! let joiner = RecordJoiner::new(people, parent_id.clone());
//!
//! let pens = vec![Record::from_attributes([parent_id.of(1)])];
//! let items: SetKey<Record> = SetKey::new("items");
//! let out = joiner.one_to_many(&pens, &items).unwrap();
//! assert_eq!(out[0].get(items.as_key()).unwrap().len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod index;
pub mod join_key;
pub mod joiner;
pub mod key;
pub mod merge;
pub mod pair;
pub mod record;
pub mod workload;

pub use config::JoinConfig;
pub use error::{JoinError, JoinOperation, KeyViolation, Side, ViolationKind};
pub use fetcher::{Fetcher, IndexFetcher};
pub use index::{Index, IndexKey};
pub use join_key::{from_fn, FnJoinKey, JoinKey};
pub use joiner::RecordJoiner;
pub use key::{FieldType, Key, SetKey};
pub use pair::Pair;
pub use record::{Attribute, Record, Value};
