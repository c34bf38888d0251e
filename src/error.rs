//! Join errors

use std::fmt;

use thiserror::Error;

/// Violations listed in an error message before the rest are elided
const MAX_LISTED_VIOLATIONS: usize = 8;

/// The five join primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinOperation {
    ManyToOne,
    StrictManyToOne,
    OneToMany,
    StrictOneToMany,
    StrictOneToOne,
}

impl JoinOperation {
    pub fn name(self) -> &'static str {
        match self {
            JoinOperation::ManyToOne => "many_to_one",
            JoinOperation::StrictManyToOne => "strict_many_to_one",
            JoinOperation::OneToMany => "one_to_many",
            JoinOperation::StrictOneToMany => "strict_one_to_many",
            JoinOperation::StrictOneToOne => "strict_one_to_one",
        }
    }
}

impl fmt::Display for JoinOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Side of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The index owned by the joiner
    Held,
    /// The records supplied to a join call
    Incoming,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Held => f.write_str("held"),
            Side::Incoming => f.write_str("incoming"),
        }
    }
}

/// What went wrong for one key under a strict contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// No record with this key on `side`
    Missing { side: Side },
    /// More than one record with this key on `side`
    Duplicate { side: Side, count: usize },
    /// Key repeated on both sides
    DuplicateBothSides { held: usize, incoming: usize },
}

impl ViolationKind {
    /// Classify a key under the one-to-one contract; `None` means exactly one
    /// record on each side.
    pub(crate) fn one_to_one(held: usize, incoming: usize) -> Option<Self> {
        match (held, incoming) {
            (1, 1) => None,
            (0, _) => Some(ViolationKind::Missing { side: Side::Held }),
            (_, 0) => Some(ViolationKind::Missing { side: Side::Incoming }),
            (1, count) => Some(ViolationKind::Duplicate {
                side: Side::Incoming,
                count,
            }),
            (count, 1) => Some(ViolationKind::Duplicate {
                side: Side::Held,
                count,
            }),
            (held, incoming) => Some(ViolationKind::DuplicateBothSides { held, incoming }),
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing { side } => write!(f, "no {} record", side),
            ViolationKind::Duplicate { side, count } => {
                write!(f, "{} {} records", count, side)
            }
            ViolationKind::DuplicateBothSides { held, incoming } => {
                write!(f, "duplicated on both sides ({} held, {} incoming)", held, incoming)
            }
        }
    }
}

/// One offending key in a strict join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyViolation {
    /// The key, rendered with `Debug`
    pub key: String,
    pub kind: ViolationKind,
    /// Records carrying this key in the held index
    pub held: usize,
    /// Records carrying this key in the incoming index
    pub incoming: usize,
}

impl KeyViolation {
    pub(crate) fn new<K: fmt::Debug>(
        key: &K,
        kind: ViolationKind,
        held: usize,
        incoming: usize,
    ) -> Self {
        Self {
            key: format!("{:?}", key),
            kind,
            held,
            incoming,
        }
    }
}

impl fmt::Display for KeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key {}: {}", self.key, self.kind)
    }
}

/// Join failure
#[derive(Debug, Error)]
pub enum JoinError {
    /// A record could not yield a join key
    #[error("could not extract join key '{key}': {detail}")]
    KeyExtraction { key: String, detail: String },

    /// A strict cardinality contract was broken
    #[error(
        "{operation} violated for {} key(s): {}",
        .violations.len(),
        list_violations(.violations)
    )]
    Cardinality {
        operation: JoinOperation,
        violations: Vec<KeyViolation>,
    },

    /// The fetcher failed; the error is passed through as-is
    #[error(transparent)]
    Fetch(anyhow::Error),
}

impl JoinError {
    /// Offending keys of a cardinality violation, empty for other errors
    pub fn violations(&self) -> &[KeyViolation] {
        match self {
            JoinError::Cardinality { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn list_violations(violations: &[KeyViolation]) -> String {
    let mut listed: Vec<String> = violations
        .iter()
        .take(MAX_LISTED_VIOLATIONS)
        .map(ToString::to_string)
        .collect();
    if violations.len() > MAX_LISTED_VIOLATIONS {
        listed.push(format!("... and {} more", violations.len() - MAX_LISTED_VIOLATIONS));
    }
    listed.join("; ")
}

/// Turn collected violations into a failure, or pass when there are none
pub(crate) fn ensure_no_violations(
    operation: JoinOperation,
    violations: Vec<KeyViolation>,
) -> Result<(), JoinError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(JoinError::Cardinality {
            operation,
            violations,
        })
    }
}
