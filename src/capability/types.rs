/*!
 * Capability Types
 * The tagged capability variants and request matching
 */

use crate::core::types::{ProcedureKey, Slot, Word};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Result type for capability operations
///
/// # Must Use
/// Capability operations can fail and must be handled to prevent
/// authority leaks
#[must_use = "capability operations can fail and must be handled"]
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Capability-model errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum CapabilityError {
    #[error("invalid capability encoding: {0}")]
    InvalidEncoding(String),

    #[error("delegated authority exceeds the delegator's granted call targets")]
    AttenuationViolation,
}

impl CapabilityError {
    /// The published status code for this rejection class
    #[must_use]
    pub fn status_code(&self) -> u32 {
        match self {
            CapabilityError::InvalidEncoding(_) => 4,
            CapabilityError::AttenuationViolation => 12,
        }
    }
}

/// Maximum number of declared topics on a log capability
pub const MAX_LOG_TOPICS: usize = 4;

/// A single granted right. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "capability", content = "scope")]
pub enum Capability {
    /// Write access to the half-open slot range `[start, start + size)`
    Write { start: Slot, size: u64 },
    /// Log emission restricted to an exact topic sequence;
    /// empty = wildcard, matches any topic set
    Log { topics: Vec<Word> },
    /// Call access to a set of procedure keys;
    /// empty = wildcard, matches any target
    Call { targets: HashSet<ProcedureKey> },
}

/// Variant discriminant, used for denial classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Write,
    Log,
    Call,
}

/// An access being requested by an executing procedure
#[derive(Debug, Clone)]
pub enum AccessRequest<'a> {
    /// Write one slot
    Write(Slot),
    /// Emit a log event with these topics
    Log(&'a [Word]),
    /// Invoke this procedure
    Call(ProcedureKey),
}

impl AccessRequest<'_> {
    /// The capability variant that could satisfy this request
    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            AccessRequest::Write(_) => CapabilityKind::Write,
            AccessRequest::Log(_) => CapabilityKind::Log,
            AccessRequest::Call(_) => CapabilityKind::Call,
        }
    }
}

impl Capability {
    /// Construct a call capability over an explicit target list
    #[must_use]
    pub fn call_targets<I>(targets: I) -> Self
    where
        I: IntoIterator<Item = ProcedureKey>,
    {
        Capability::Call {
            targets: targets.into_iter().collect(),
        }
    }

    /// Construct the wildcard call capability
    #[must_use]
    pub fn call_any() -> Self {
        Capability::Call {
            targets: HashSet::new(),
        }
    }

    /// Construct the wildcard log capability
    #[must_use]
    pub fn log_any() -> Self {
        Capability::Log { topics: Vec::new() }
    }

    #[must_use]
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Write { .. } => CapabilityKind::Write,
            Capability::Log { .. } => CapabilityKind::Log,
            Capability::Call { .. } => CapabilityKind::Call,
        }
    }

    /// Check whether this capability satisfies a request.
    ///
    /// Only same-variant pairs can match; a `Write` capability never
    /// authorizes a `Call`, and so on.
    #[must_use]
    pub fn grants(&self, request: &AccessRequest<'_>) -> bool {
        match (self, request) {
            (Capability::Write { start, size }, AccessRequest::Write(slot)) => {
                // u128 arithmetic sidesteps overflow at the top of the range
                let slot = u128::from(*slot);
                let start = u128::from(*start);
                start <= slot && slot < start + u128::from(*size)
            }
            (Capability::Log { topics }, AccessRequest::Log(requested)) => {
                topics.is_empty() || topics.as_slice() == *requested
            }
            (Capability::Call { targets }, AccessRequest::Call(target)) => {
                targets.is_empty() || targets.contains(target)
            }
            _ => false,
        }
    }

    /// The attenuation predicate: true when every access this capability
    /// grants is also granted by `other`. Only same-variant pairs are
    /// comparable.
    #[must_use]
    pub fn is_subset_of(&self, other: &Capability) -> bool {
        match (self, other) {
            (
                Capability::Write { start, size },
                Capability::Write {
                    start: other_start,
                    size: other_size,
                },
            ) => {
                if *size == 0 {
                    // An empty range grants nothing
                    return true;
                }
                let end = u128::from(*start) + u128::from(*size);
                let other_end = u128::from(*other_start) + u128::from(*other_size);
                *start >= *other_start && end <= other_end
            }
            (Capability::Log { topics }, Capability::Log { topics: other_topics }) => {
                other_topics.is_empty() || topics == other_topics
            }
            (Capability::Call { targets }, Capability::Call { targets: other_targets }) => {
                other_targets.is_empty()
                    || (!targets.is_empty() && targets.is_subset(other_targets))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Write { start, size } => write!(f, "Write[{}..{}+{}]", start, start, size),
            Capability::Log { topics } if topics.is_empty() => write!(f, "Log[*]"),
            Capability::Log { topics } => write!(f, "Log[{} topics]", topics.len()),
            Capability::Call { targets } if targets.is_empty() => write!(f, "Call[*]"),
            Capability::Call { targets } => {
                let mut labels: Vec<String> = targets.iter().map(|k| k.label()).collect();
                labels.sort();
                write!(f, "Call[{}]", labels.join(","))
            }
        }
    }
}
