//! A single append-only checkpoint sequence.

use covenant_types::{SequencePoint, TokenAmount};
use serde::{Deserialize, Serialize};

/// A recorded (sequence-point, power) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub at: SequencePoint,
    pub power: TokenAmount,
}

/// An ordered sequence of checkpoints, strictly increasing in sequence point.
///
/// Recording at the last recorded point overwrites that entry instead of
/// duplicating it, so several mutations within one operation collapse into
/// a single checkpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckpointHistory {
    entries: Vec<Checkpoint>,
}

impl CheckpointHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `power` as of `at`.
    ///
    /// Points arrive in operation order; a point earlier than the last
    /// recorded one would rewrite history and is ignored.
    pub fn record(&mut self, at: SequencePoint, power: TokenAmount) {
        if let Some(last) = self.entries.last_mut() {
            if last.at == at {
                last.power = power;
                return;
            }
            if at < last.at {
                return;
            }
        }
        self.entries.push(Checkpoint { at, power });
    }

    /// The power recorded at the latest checkpoint at or before `point`,
    /// or zero if no checkpoint exists that early.
    pub fn value_at(&self, point: SequencePoint) -> TokenAmount {
        let idx = self.entries.partition_point(|c| c.at <= point);
        if idx == 0 {
            TokenAmount::ZERO
        } else {
            self.entries[idx - 1].power
        }
    }

    /// The most recently recorded power, or zero if empty.
    pub fn latest(&self) -> TokenAmount {
        self.entries.last().map_or(TokenAmount::ZERO, |c| c.power)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
