//! Join tuning configuration
//!
//! Controls how the merge stage of a join is parallelised. Values come from
//! defaults, a JSON file, or `RECORD_JOIN_*` environment variables (a `.env`
//! file is honoured).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pairs below this count are merged on the calling thread
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Worker count override; `0` or `auto` means one worker per CPU
pub const WORKERS_ENV: &str = "RECORD_JOIN_WORKERS";
/// Parallel threshold override
pub const PARALLEL_THRESHOLD_ENV: &str = "RECORD_JOIN_PARALLEL_THRESHOLD";

/// Configuration for parallel merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Dedicated worker threads; `None` runs on the rayon global pool
    pub num_workers: Option<usize>,
    /// Minimum number of matched pairs before merging fans out to workers
    pub parallel_threshold: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl JoinConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        skip_missing_env_file(dotenvy::dotenv())?;
        Self::default().apply_vars(|name| std::env::var(name).ok())
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read join config: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse join config: {}", path.display()))
    }

    /// Apply `RECORD_JOIN_*` overrides read through `lookup`
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(WORKERS_ENV) {
            let raw = raw.trim();
            let workers = if raw.eq_ignore_ascii_case("auto") {
                0
            } else {
                raw.parse::<usize>()
                    .with_context(|| format!("Invalid {}: {:?}", WORKERS_ENV, raw))?
            };
            self = self.with_workers(workers);
        }

        if let Some(raw) = lookup(PARALLEL_THRESHOLD_ENV) {
            let threshold = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid {}: {:?}", PARALLEL_THRESHOLD_ENV, raw))?;
            self.parallel_threshold = threshold;
        }

        Ok(self)
    }

    /// Use a dedicated pool of `workers` threads (`0` = one per CPU)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(if workers == 0 { num_cpus::get() } else { workers });
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Dedicated worker pool, if one is configured
    pub fn build_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        let Some(workers) = self.num_workers else {
            return Ok(None);
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("record-join-{}", i))
            .build()
            .context("Failed to create rayon thread pool")?;
        Ok(Some(pool))
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not
fn skip_missing_env_file<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}
