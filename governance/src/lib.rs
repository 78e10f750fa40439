//! Proposal-based governance for the covenant token.
//!
//! Token holders collectively authorize privileged operations through a
//! proposal lifecycle: create → vote → queue → execute, with quorum checked
//! against the historical total supply and a mandatory timelock between
//! success and execution. Voting weight is fixed at the proposal's snapshot
//! point, so power acquired after creation cannot swing a vote.
//!
//! Follow-on actions are dispatched through a single controlled boundary
//! ([`ActionDispatcher`]); the first failing action aborts the whole
//! execution with its index and reason.

pub mod action;
pub mod engine;
pub mod error;
pub mod params;
pub mod proposal;

pub use action::{ActionDispatcher, ProposalAction, OWNERSHIP_TRANSFER_SELECTOR};
pub use engine::{GovernanceEngine, GovernanceSnapshot};
pub use error::GovernanceError;
pub use params::{
    GovernanceParams, MAX_EXECUTION_DELAY_SECS, MAX_PROPOSAL_ACTIONS, MIN_EXECUTION_DELAY_SECS,
    QUORUM_DENOMINATOR,
};
pub use proposal::{DefeatReason, Proposal, ProposalId, ProposalStatus, VoteSupport};
