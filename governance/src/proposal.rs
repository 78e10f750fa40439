//! Proposals and their lifecycle vocabulary.

use crate::action::ProposalAction;
use covenant_types::{AccountId, SequencePoint, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Monotonically increasing proposal identifier.
pub type ProposalId = u64;

/// A voter's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

/// Externally reported lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Before the voting window opens.
    Pending,
    /// Within the voting window.
    Active,
    /// Voting closed without meeting quorum, or without for > against.
    Defeated,
    /// Voting closed successfully; not yet queued.
    Succeeded,
    /// Queued; the timelock is running.
    Queued,
    /// Timelock elapsed; executable until the window closes.
    Ready,
    /// Executed (terminal).
    Executed,
    /// The execution window lapsed (terminal).
    Expired,
    /// Canceled by the proposer or the owner (terminal).
    Canceled,
}

/// Why a proposal was defeated — kept distinguishable for audit even though
/// the external status collapses both to `Defeated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefeatReason {
    /// Turnout fell short of the quorum.
    QuorumNotReached,
    /// Quorum was met but for-votes did not strictly exceed against-votes
    /// (a tie defeats).
    NotCarried,
}

/// A governance proposal. Registry entries are append-only and never
/// deleted; every field except the tallies and the terminal flags is fixed
/// at creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: AccountId,
    pub description: String,
    /// Point at which voting power is fixed for this proposal's lifetime.
    pub snapshot: SequencePoint,
    /// First point at which votes are accepted.
    pub start: SequencePoint,
    /// Last point at which votes are accepted (inclusive).
    pub end: SequencePoint,
    pub for_votes: TokenAmount,
    pub against_votes: TokenAmount,
    pub abstain_votes: TokenAmount,
    pub executed: bool,
    pub canceled: bool,
    /// Actions performed, in order, on successful execution.
    pub actions: Vec<ProposalAction>,
    /// Execution-eligibility time; `None` until queued.
    pub eta: Option<Timestamp>,
}

impl Proposal {
    /// Terminal by execution or cancellation.
    pub fn is_finalized(&self) -> bool {
        self.executed || self.canceled
    }

    /// Total weight cast across all three positions.
    ///
    /// Each account votes once with weight bounded by the snapshot supply,
    /// so the sum is bounded by the snapshot supply as well.
    pub fn turnout(&self) -> TokenAmount {
        self.for_votes + self.against_votes + self.abstain_votes
    }

    /// Whether for-votes strictly exceed against-votes.
    pub fn carried(&self) -> bool {
        self.for_votes > self.against_votes
    }

    /// Whether `at` falls inside the voting window.
    pub fn voting_open(&self, at: SequencePoint) -> bool {
        at >= self.start && at <= self.end
    }

    /// Whether the voting window has closed.
    pub fn voting_over(&self, at: SequencePoint) -> bool {
        at > self.end
    }
}
