use crate::proposal::ProposalId;
use covenant_checkpoints::CheckpointError;
use covenant_types::{AccountId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    NoSuchProposal(ProposalId),

    #[error("proposal {0} is finalized")]
    ProposalFinalized(ProposalId),

    #[error("voting window is closed for this proposal")]
    VotingClosed,

    #[error("account {0} has already voted on this proposal")]
    AlreadyVoted(AccountId),

    #[error("account has no voting power at the proposal snapshot")]
    NoVotingPower,

    #[error("proposer power below threshold: have {have}, need {need}")]
    BelowProposalThreshold { have: u128, need: u128 },

    #[error("quorum not met: turnout {have}, need {need}")]
    QuorumNotMet { have: u128, need: u128 },

    #[error("proposal has not passed")]
    NotPassed,

    #[error("proposal is already queued")]
    AlreadyQueued,

    #[error("proposal has not been queued")]
    NotQueued,

    #[error("timelock has not elapsed: eta {eta}, now {now}")]
    TimelockNotElapsed { eta: Timestamp, now: Timestamp },

    #[error("execution window expired at {deadline}, now {now}")]
    ExecutionExpired { deadline: Timestamp, now: Timestamp },

    #[error("action {index} failed: {reason}")]
    ActionFailed { index: usize, reason: String },

    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("caller lacks the required capability")]
    Unauthorized,

    #[error("reentrant call into a guarded entry point")]
    ReentrantCall,

    #[error("power ledger error: {0}")]
    Power(#[from] CheckpointError),
}
