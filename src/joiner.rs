//! Record join orchestration
//!
//! A [`RecordJoiner`] holds one pre-built [`Index`] and a [`JoinKey`] for
//! the other side. Every join call:
//!
//! 1. Obtains the incoming records (a slice, a lazy sequence, or a
//!    [`Fetcher`] asked for the held keys)
//! 2. Indexes them with the joiner's join key
//! 3. Pairs the held index with that transient index using one of the five
//!    [`Index`] primitives
//! 4. Merges every pair into one output record (in parallel for large joins)
//!
//! The held index is never modified and the joiner carries no other state,
//! so one joiner can serve concurrent calls from several threads.

use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

use crate::config::JoinConfig;
use crate::error::{JoinError, JoinOperation};
use crate::fetcher::Fetcher;
use crate::index::{Index, IndexKey};
use crate::join_key::JoinKey;
use crate::key::SetKey;
use crate::merge::{merge_many, merge_one};
use crate::pair::Pair;
use crate::record::Record;

/// Joins incoming records against a held index
pub struct RecordJoiner<K, J> {
    held: Index<K>,
    join_key: J,
    config: JoinConfig,
    pool: Option<rayon::ThreadPool>,
}

impl<K, J> RecordJoiner<K, J>
where
    K: IndexKey,
    J: JoinKey<K>,
{
    /// Joiner with default configuration (merging on the rayon global pool)
    pub fn new(held: Index<K>, join_key: J) -> Self {
        Self {
            held,
            join_key,
            config: JoinConfig::default(),
            pool: None,
        }
    }

    /// Joiner with explicit configuration; builds the worker pool if one is
    /// configured
    pub fn with_config(held: Index<K>, join_key: J, config: JoinConfig) -> Result<Self> {
        let pool = config.build_pool()?;
        Ok(Self {
            held,
            join_key,
            config,
            pool,
        })
    }

    pub fn held(&self) -> &Index<K> {
        &self.held
    }

    pub fn join_key(&self) -> &J {
        &self.join_key
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    // --- many-to-one ---

    /// Lenient many-to-one over an in-memory collection
    ///
    /// Each incoming record whose key has exactly one held record comes out
    /// as `incoming.with(held)`; all others are dropped.
    pub fn many_to_one(&self, incoming: &[Record]) -> Result<Vec<Record>, JoinError> {
        self.many_to_one_iter(incoming.iter().cloned())
    }

    pub fn many_to_one_iter<I>(&self, incoming: I) -> Result<Vec<Record>, JoinError>
    where
        I: IntoIterator<Item = Record>,
    {
        let incoming = self.join_key.index(incoming)?;
        self.join(
            JoinOperation::ManyToOne,
            &incoming,
            |held, incoming| Ok(held.many_to_one(incoming)),
            merge_one,
        )
    }

    pub fn many_to_one_fetch(&self, fetcher: &dyn Fetcher<K>) -> Result<Vec<Record>, JoinError> {
        let fetched = self.fetch(fetcher)?;
        self.many_to_one_iter(fetched)
    }

    // --- strict many-to-one ---

    /// Many-to-one that fails unless every incoming key has exactly one held
    /// record
    pub fn strict_many_to_one(&self, incoming: &[Record]) -> Result<Vec<Record>, JoinError> {
        self.strict_many_to_one_iter(incoming.iter().cloned())
    }

    pub fn strict_many_to_one_iter<I>(&self, incoming: I) -> Result<Vec<Record>, JoinError>
    where
        I: IntoIterator<Item = Record>,
    {
        let incoming = self.join_key.index(incoming)?;
        self.join(
            JoinOperation::StrictManyToOne,
            &incoming,
            |held, incoming| held.strict_many_to_one(incoming),
            merge_one,
        )
    }

    pub fn strict_many_to_one_fetch(
        &self,
        fetcher: &dyn Fetcher<K>,
    ) -> Result<Vec<Record>, JoinError> {
        let fetched = self.fetch(fetcher)?;
        self.strict_many_to_one_iter(fetched)
    }

    // --- one-to-many ---

    /// Lenient one-to-many
    ///
    /// One output per held record, carrying the set of matching incoming
    /// records under `many_key` (empty when nothing matched).
    pub fn one_to_many(
        &self,
        incoming: &[Record],
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError> {
        self.one_to_many_iter(incoming.iter().cloned(), many_key)
    }

    pub fn one_to_many_iter<I>(
        &self,
        incoming: I,
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError>
    where
        I: IntoIterator<Item = Record>,
    {
        let incoming = self.join_key.index(incoming)?;
        self.join(
            JoinOperation::OneToMany,
            &incoming,
            |held, incoming| Ok(held.one_to_many(incoming)),
            merge_many(many_key),
        )
    }

    pub fn one_to_many_fetch(
        &self,
        fetcher: &dyn Fetcher<K>,
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError> {
        let fetched = self.fetch(fetcher)?;
        self.one_to_many_iter(fetched, many_key)
    }

    // --- strict one-to-many ---

    /// One-to-many that fails if any held key has no incoming match
    pub fn strict_one_to_many(
        &self,
        incoming: &[Record],
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError> {
        self.strict_one_to_many_iter(incoming.iter().cloned(), many_key)
    }

    pub fn strict_one_to_many_iter<I>(
        &self,
        incoming: I,
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError>
    where
        I: IntoIterator<Item = Record>,
    {
        let incoming = self.join_key.index(incoming)?;
        self.join(
            JoinOperation::StrictOneToMany,
            &incoming,
            |held, incoming| held.strict_one_to_many(incoming),
            merge_many(many_key),
        )
    }

    pub fn strict_one_to_many_fetch(
        &self,
        fetcher: &dyn Fetcher<K>,
        many_key: &SetKey<Record>,
    ) -> Result<Vec<Record>, JoinError> {
        let fetched = self.fetch(fetcher)?;
        self.strict_one_to_many_iter(fetched, many_key)
    }

    // --- strict one-to-one ---

    /// Bijective join: every key exactly once on each side
    ///
    /// Outputs follow held order and merge as `held.with(incoming)`.
    pub fn strict_one_to_one(&self, incoming: &[Record]) -> Result<Vec<Record>, JoinError> {
        self.strict_one_to_one_iter(incoming.iter().cloned())
    }

    pub fn strict_one_to_one_iter<I>(&self, incoming: I) -> Result<Vec<Record>, JoinError>
    where
        I: IntoIterator<Item = Record>,
    {
        let incoming = self.join_key.index(incoming)?;
        self.join(
            JoinOperation::StrictOneToOne,
            &incoming,
            |held, incoming| held.strict_one_to_one(incoming),
            merge_one,
        )
    }

    pub fn strict_one_to_one_fetch(
        &self,
        fetcher: &dyn Fetcher<K>,
    ) -> Result<Vec<Record>, JoinError> {
        let fetched = self.fetch(fetcher)?;
        self.strict_one_to_one_iter(fetched)
    }

    fn fetch(&self, fetcher: &dyn Fetcher<K>) -> Result<Vec<Record>, JoinError> {
        let keys = self.held.keys();
        debug!(keys = keys.len(), "fetching incoming records");
        let records = fetcher.fetch(&keys).map_err(JoinError::Fetch)?;
        debug!(records = records.len(), "fetcher returned");
        Ok(records)
    }

    fn join<R, P, M>(
        &self,
        operation: JoinOperation,
        incoming: &Index<K>,
        pair: P,
        merge: M,
    ) -> Result<Vec<Record>, JoinError>
    where
        R: Send,
        P: FnOnce(&Index<K>, &Index<K>) -> Result<Vec<Pair<Record, R>>, JoinError>,
        M: Fn(Pair<Record, R>) -> Record + Send + Sync,
    {
        let pairs = pair(&self.held, incoming)?;
        let merged = self.merge_pairs(pairs, merge);
        debug!(
            %operation,
            held = self.held.len(),
            incoming = incoming.len(),
            output = merged.len(),
            "record join complete"
        );
        Ok(merged)
    }

    /// Merge stage; output order always matches pair order
    fn merge_pairs<R, M>(&self, pairs: Vec<Pair<Record, R>>, merge: M) -> Vec<Record>
    where
        R: Send,
        M: Fn(Pair<Record, R>) -> Record + Send + Sync,
    {
        if pairs.len() < self.config.parallel_threshold {
            return pairs.into_iter().map(merge).collect();
        }

        match &self.pool {
            Some(pool) => pool.install(|| pairs.into_par_iter().map(&merge).collect()),
            None => pairs.into_par_iter().map(merge).collect(),
        }
    }
}
