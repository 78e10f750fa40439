//! Sequence points — positions in the global operation order.
//!
//! The execution environment serializes every operation into a single total
//! order; a `SequencePoint` names a position in that order. Checkpoints,
//! proposal snapshots, and voting windows are all expressed in sequence
//! points rather than wall-clock time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in the globally serialized operation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequencePoint(u64);

impl SequencePoint {
    /// The origin of the sequence (point zero).
    pub const GENESIS: Self = Self(0);

    pub fn new(point: u64) -> Self {
        Self(point)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The point `offset` positions later.
    pub fn advanced_by(&self, offset: u64) -> Self {
        Self(self.0.saturating_add(offset))
    }

    /// The point immediately before this one, or GENESIS at the origin.
    pub fn prev(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for SequencePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
