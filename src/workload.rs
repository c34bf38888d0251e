//! Synthetic join workloads for benchmarks and the `join_bench` harness

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::key::Key;
use crate::record::{Attribute, Record};

/// Held-side key attribute
pub fn held_key() -> Key<i64> {
    Key::new("id")
}

/// Incoming-side key attribute
pub fn incoming_key() -> Key<i64> {
    Key::new("parent_id")
}

/// Generated held and incoming records
#[derive(Debug, Clone)]
pub struct Workload {
    pub held: Vec<Record>,
    pub incoming: Vec<Record>,
}

impl Workload {
    /// `held` parents with unique ids and `incoming` children
    ///
    /// The first `min(held, incoming)` children cover parents in order so that
    /// strict one-to-many holds whenever `incoming >= held`; the rest pick a
    /// random parent.
    pub fn parents_and_children(held: usize, incoming: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let parents = (0..held as i64).map(parent).collect();
        let children = (0..incoming)
            .map(|i| {
                let owner = if i < held || held == 0 {
                    i as i64
                } else {
                    rng.gen_range(0..held as i64)
                };
                child(i as i64, owner, rng.gen_range(1..=10_000))
            })
            .collect();
        Self {
            held: parents,
            incoming: children,
        }
    }

    /// `n` parents and exactly one child per parent, shuffled
    pub fn one_to_one(n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut owners: Vec<i64> = (0..n as i64).collect();
        owners.shuffle(&mut rng);
        Self {
            held: (0..n as i64).map(parent).collect(),
            incoming: owners
                .into_iter()
                .enumerate()
                .map(|(i, owner)| child(i as i64, owner, rng.gen_range(1..=10_000)))
                .collect(),
        }
    }
}

fn parent(id: i64) -> Record {
    Record::from_attributes([
        held_key().of(id),
        Attribute::new("name", format!("parent-{}", id)),
        Attribute::new("active", id % 3 != 0),
    ])
}

fn child(seq: i64, owner: i64, amount: i64) -> Record {
    Record::from_attributes([
        incoming_key().of(owner),
        Attribute::new("seq", seq),
        Attribute::new("amount", amount),
    ])
}
