//! On-demand record sources for the incoming side of a join

use std::collections::BTreeSet;

use anyhow::Result;

use crate::index::{Index, IndexKey};
use crate::record::Record;

/// External record source keyed by join key
///
/// A fetcher-backed join calls [`Fetcher::fetch`] exactly once, with every
/// key of the held index. Whether that hits memory, disk or the network is
/// up to the implementation, as is any retry or timeout policy; an error
/// fails the join unchanged.
pub trait Fetcher<K> {
    fn fetch(&self, keys: &BTreeSet<K>) -> Result<Vec<Record>>;
}

impl<K, F> Fetcher<K> for F
where
    F: Fn(&BTreeSet<K>) -> Result<Vec<Record>>,
{
    fn fetch(&self, keys: &BTreeSet<K>) -> Result<Vec<Record>> {
        self(keys)
    }
}

/// Fetcher serving records out of a pre-built index
///
/// Returns the records of each requested key, keys in ascending order and
/// records in insertion order. Unknown keys contribute nothing.
#[derive(Debug, Clone)]
pub struct IndexFetcher<K> {
    index: Index<K>,
}

impl<K: IndexKey> IndexFetcher<K> {
    pub fn new(index: Index<K>) -> Self {
        Self { index }
    }
}

impl<K: IndexKey> Fetcher<K> for IndexFetcher<K> {
    fn fetch(&self, keys: &BTreeSet<K>) -> Result<Vec<Record>> {
        Ok(keys
            .iter()
            .flat_map(|key| self.index.get(key).iter().cloned())
            .collect())
    }
}
