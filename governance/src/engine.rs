//! Core governance engine — the proposal registry and lifecycle state
//! machine.
//!
//! The engine reads voting power through a shared [`PowerLedger`]
//! reference; the environment must have advanced the ledger's finalization
//! horizon to the sequence point it passes in (the token ledger does this
//! on every operation).

use crate::action::{ActionDispatcher, ProposalAction};
use crate::error::GovernanceError;
use crate::params::{
    GovernanceParams, MAX_EXECUTION_DELAY_SECS, MAX_PROPOSAL_ACTIONS, MIN_EXECUTION_DELAY_SECS,
    QUORUM_DENOMINATOR,
};
use crate::proposal::{DefeatReason, Proposal, ProposalId, ProposalStatus, VoteSupport};
use covenant_checkpoints::PowerLedger;
use covenant_policy::RoleRegistry;
use covenant_types::{AccountId, SequencePoint, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Owns the proposal registry and vote receipts.
pub struct GovernanceEngine {
    params: GovernanceParams,
    /// Append-only registry; ids are assigned from `next_id`, never reused.
    proposals: BTreeMap<ProposalId, Proposal>,
    /// Receipts: per proposal, the set of accounts that have voted.
    voted: HashMap<ProposalId, HashSet<AccountId>>,
    next_id: ProposalId,
    /// Re-entry lock for guarded entry points.
    executing: bool,
}

impl GovernanceEngine {
    pub fn new(params: GovernanceParams) -> Self {
        Self {
            params,
            proposals: BTreeMap::new(),
            voted: HashMap::new(),
            next_id: 1,
            executing: false,
        }
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    /// Replace the voting parameters. Owner only; values are validated.
    pub fn set_params(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        params: GovernanceParams,
    ) -> Result<(), GovernanceError> {
        if !roles.is_owner(caller) {
            return Err(GovernanceError::Unauthorized);
        }
        params.validate()?;
        tracing::info!(?params, "governance parameters updated");
        self.params = params;
        Ok(())
    }

    /// Register a new proposal and open its lifecycle.
    ///
    /// The proposer's power one point before `at` must meet the proposal
    /// threshold. Actions are bounded in number and screened against the
    /// privileged ownership-transfer selector before any state is written.
    pub fn create_proposal(
        &mut self,
        proposer: &AccountId,
        actions: Vec<ProposalAction>,
        description: String,
        power: &PowerLedger,
        at: SequencePoint,
    ) -> Result<ProposalId, GovernanceError> {
        if actions.is_empty() || actions.len() > MAX_PROPOSAL_ACTIONS {
            return Err(GovernanceError::InvalidParameters {
                reason: format!(
                    "a proposal must carry between 1 and {} actions, got {}",
                    MAX_PROPOSAL_ACTIONS,
                    actions.len()
                ),
            });
        }
        Self::screen_actions(&actions)?;

        let have = power.power_at(proposer, at.prev())?;
        let need = TokenAmount::new(u128::from(self.params.proposal_threshold));
        if have < need {
            return Err(GovernanceError::BelowProposalThreshold {
                have: have.raw(),
                need: need.raw(),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let start = at.advanced_by(self.params.voting_delay);
        let proposal = Proposal {
            id,
            proposer: *proposer,
            description,
            snapshot: at,
            start,
            end: start.advanced_by(self.params.voting_period),
            for_votes: TokenAmount::ZERO,
            against_votes: TokenAmount::ZERO,
            abstain_votes: TokenAmount::ZERO,
            executed: false,
            canceled: false,
            actions,
            eta: None,
        };
        tracing::info!(
            id,
            proposer = %proposer,
            snapshot = %proposal.snapshot,
            start = %proposal.start,
            end = %proposal.end,
            "proposal created"
        );
        self.proposals.insert(id, proposal);
        self.voted.insert(id, HashSet::new());
        Ok(id)
    }

    /// Cast a vote. Weight is the voter's power at the proposal snapshot;
    /// one vote per account, no changes. Returns the weight counted.
    pub fn cast_vote(
        &mut self,
        voter: &AccountId,
        id: ProposalId,
        support: VoteSupport,
        power: &PowerLedger,
        at: SequencePoint,
    ) -> Result<TokenAmount, GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NoSuchProposal(id))?;
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        if !proposal.voting_open(at) {
            return Err(GovernanceError::VotingClosed);
        }
        let receipts = self.voted.entry(id).or_default();
        if receipts.contains(voter) {
            return Err(GovernanceError::AlreadyVoted(*voter));
        }

        let weight = power.power_at(voter, proposal.snapshot)?;
        if weight.is_zero() {
            return Err(GovernanceError::NoVotingPower);
        }

        receipts.insert(*voter);
        match support {
            VoteSupport::For => proposal.for_votes = proposal.for_votes + weight,
            VoteSupport::Against => proposal.against_votes = proposal.against_votes + weight,
            VoteSupport::Abstain => proposal.abstain_votes = proposal.abstain_votes + weight,
        }
        tracing::debug!(id, voter = %voter, ?support, weight = %weight, "vote cast");
        Ok(weight)
    }

    /// Cancel a proposal. Proposer or owner only; allowed from any
    /// non-terminal state.
    pub fn cancel(
        &mut self,
        caller: &AccountId,
        id: ProposalId,
        roles: &RoleRegistry,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NoSuchProposal(id))?;
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        if *caller != proposal.proposer && !roles.is_owner(caller) {
            return Err(GovernanceError::Unauthorized);
        }
        proposal.canceled = true;
        tracing::info!(id, by = %caller, "proposal canceled");
        Ok(())
    }

    /// Start the timelock for a successful proposal.
    ///
    /// Requires the voting window to be over, turnout to meet quorum, and
    /// for-votes to strictly exceed against-votes; a tie or insufficient
    /// turnout is permanently defeated and can never be queued.
    pub fn queue(
        &mut self,
        id: ProposalId,
        power: &PowerLedger,
        at: SequencePoint,
        now: Timestamp,
    ) -> Result<Timestamp, GovernanceError> {
        let (snapshot, turnout, carried) = {
            let proposal = self
                .proposals
                .get(&id)
                .ok_or(GovernanceError::NoSuchProposal(id))?;
            if proposal.is_finalized() {
                return Err(GovernanceError::ProposalFinalized(id));
            }
            if proposal.eta.is_some() {
                return Err(GovernanceError::AlreadyQueued);
            }
            if !proposal.voting_over(at) {
                return Err(GovernanceError::NotPassed);
            }
            (proposal.snapshot, proposal.turnout(), proposal.carried())
        };

        let quorum = self.quorum_at(snapshot, power)?;
        if turnout < quorum {
            return Err(GovernanceError::QuorumNotMet {
                have: turnout.raw(),
                need: quorum.raw(),
            });
        }
        if !carried {
            return Err(GovernanceError::NotPassed);
        }

        let eta = now.plus_secs(MIN_EXECUTION_DELAY_SECS);
        let Some(proposal) = self.proposals.get_mut(&id) else {
            return Err(GovernanceError::NoSuchProposal(id));
        };
        proposal.eta = Some(eta);
        tracing::info!(id, eta = %eta, quorum = %quorum, "proposal queued");
        Ok(eta)
    }

    /// Execute a queued proposal's actions through `dispatcher`.
    ///
    /// The proposal is marked executed before any outbound call so a
    /// reentrant attempt observes it finalized; the mark is rolled back
    /// when an action fails, leaving no partial engine state.
    pub fn execute(
        &mut self,
        id: ProposalId,
        now: Timestamp,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        if self.executing {
            return Err(GovernanceError::ReentrantCall);
        }
        self.executing = true;
        let result = self.execute_inner(id, now, dispatcher);
        // Release the lock on every exit path, including failure.
        self.executing = false;
        result
    }

    fn execute_inner(
        &mut self,
        id: ProposalId,
        now: Timestamp,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<(), GovernanceError> {
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(GovernanceError::NoSuchProposal(id))?;
        if proposal.is_finalized() {
            return Err(GovernanceError::ProposalFinalized(id));
        }
        let eta = proposal.eta.ok_or(GovernanceError::NotQueued)?;
        if now < eta {
            return Err(GovernanceError::TimelockNotElapsed { eta, now });
        }
        let deadline = eta.plus_secs(MAX_EXECUTION_DELAY_SECS);
        if now > deadline {
            return Err(GovernanceError::ExecutionExpired { deadline, now });
        }
        // The forbidden selector must be absent at execution time as well,
        // not only at creation.
        Self::screen_actions(&proposal.actions)?;

        // Effects before interactions.
        proposal.executed = true;
        for (index, action) in proposal.actions.iter().enumerate() {
            if let Err(reason) = dispatcher.dispatch(index, action) {
                proposal.executed = false;
                tracing::warn!(id, index, reason, "proposal execution aborted");
                return Err(GovernanceError::ActionFailed { index, reason });
            }
        }
        tracing::info!(id, "proposal executed");
        Ok(())
    }

    /// The lifecycle state of a proposal as of (`at`, `now`).
    pub fn status(
        &self,
        id: ProposalId,
        power: &PowerLedger,
        at: SequencePoint,
        now: Timestamp,
    ) -> Result<ProposalStatus, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::NoSuchProposal(id))?;
        if proposal.canceled {
            return Ok(ProposalStatus::Canceled);
        }
        if proposal.executed {
            return Ok(ProposalStatus::Executed);
        }
        if at < proposal.start {
            return Ok(ProposalStatus::Pending);
        }
        if at <= proposal.end {
            return Ok(ProposalStatus::Active);
        }

        let quorum = self.quorum_at(proposal.snapshot, power)?;
        if proposal.turnout() < quorum || !proposal.carried() {
            return Ok(ProposalStatus::Defeated);
        }
        match proposal.eta {
            None => Ok(ProposalStatus::Succeeded),
            Some(eta) if now < eta => Ok(ProposalStatus::Queued),
            Some(eta) if now <= eta.plus_secs(MAX_EXECUTION_DELAY_SECS) => {
                Ok(ProposalStatus::Ready)
            }
            Some(_) => Ok(ProposalStatus::Expired),
        }
    }

    /// Why the proposal is defeated, or `None` if it is not. The two
    /// conditions stay distinguishable for audit; quorum failure takes
    /// precedence when both hold.
    pub fn defeat_reason(
        &self,
        id: ProposalId,
        power: &PowerLedger,
        at: SequencePoint,
    ) -> Result<Option<DefeatReason>, GovernanceError> {
        let proposal = self
            .proposals
            .get(&id)
            .ok_or(GovernanceError::NoSuchProposal(id))?;
        if proposal.is_finalized() || !proposal.voting_over(at) {
            return Ok(None);
        }
        let quorum = self.quorum_at(proposal.snapshot, power)?;
        if proposal.turnout() < quorum {
            return Ok(Some(DefeatReason::QuorumNotReached));
        }
        if !proposal.carried() {
            return Ok(Some(DefeatReason::NotCarried));
        }
        Ok(None)
    }

    /// Pure projection of a proposal by id.
    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// The ordered action list of a proposal.
    pub fn actions(&self, id: ProposalId) -> Result<&[ProposalAction], GovernanceError> {
        self.proposals
            .get(&id)
            .map(|p| p.actions.as_slice())
            .ok_or(GovernanceError::NoSuchProposal(id))
    }

    /// (for, against, abstain) tallies of a proposal.
    pub fn tallies(
        &self,
        id: ProposalId,
    ) -> Result<(TokenAmount, TokenAmount, TokenAmount), GovernanceError> {
        self.proposals
            .get(&id)
            .map(|p| (p.for_votes, p.against_votes, p.abstain_votes))
            .ok_or(GovernanceError::NoSuchProposal(id))
    }

    pub fn has_voted(&self, id: ProposalId, voter: &AccountId) -> bool {
        self.voted.get(&id).is_some_and(|set| set.contains(voter))
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    fn quorum_at(
        &self,
        snapshot: SequencePoint,
        power: &PowerLedger,
    ) -> Result<TokenAmount, GovernanceError> {
        let total = power.total_power_at(snapshot)?;
        total
            .checked_mul_div(u128::from(self.params.quorum_numerator), QUORUM_DENOMINATOR)
            .ok_or(GovernanceError::InvalidParameters {
                reason: "quorum computation overflow".into(),
            })
    }

    fn screen_actions(actions: &[ProposalAction]) -> Result<(), GovernanceError> {
        for (index, action) in actions.iter().enumerate() {
            if action.is_ownership_transfer() {
                return Err(GovernanceError::InvalidParameters {
                    reason: format!(
                        "action {index} encodes the privileged ownership-transfer operation"
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Default for GovernanceEngine {
    fn default() -> Self {
        Self::new(GovernanceParams::default())
    }
}

/// Meta-store key used for persisting the governance engine state.
const GOVERNANCE_ENGINE_META_KEY: &str = "governance_engine_state";

/// Serializable snapshot of the engine's registry and receipts.
///
/// The reentrancy flag is transient and deliberately not part of the
/// snapshot.
#[derive(Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub params: GovernanceParams,
    pub proposals: BTreeMap<ProposalId, Proposal>,
    pub voted: HashMap<ProposalId, HashSet<AccountId>>,
    pub next_id: ProposalId,
}

impl GovernanceEngine {
    /// Serialize the engine to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = GovernanceSnapshot {
            params: self.params.clone(),
            proposals: self.proposals.clone(),
            voted: self.voted.clone(),
            next_id: self.next_id,
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore the engine from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        match bincode::deserialize::<GovernanceSnapshot>(data) {
            Ok(snapshot) => Self {
                params: snapshot.params,
                proposals: snapshot.proposals,
                voted: snapshot.voted,
                next_id: snapshot.next_id,
                executing: false,
            },
            Err(_) => Self::default(),
        }
    }

    /// The meta-store key used for governance engine persistence.
    pub fn meta_key() -> &'static str {
        GOVERNANCE_ENGINE_META_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 32])
    }

    fn pt(p: u64) -> SequencePoint {
        SequencePoint::new(p)
    }

    fn amt(a: u128) -> TokenAmount {
        TokenAmount::new(a)
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn action() -> ProposalAction {
        ProposalAction {
            target: account(50),
            value: TokenAmount::ZERO,
            payload: vec![0xaa, 0xbb, 0xcc, 0xdd],
        }
    }

    /// Power ledger with `holders` balances recorded at point 1 and the
    /// horizon advanced past `observed`.
    fn power_with(holders: &[(AccountId, u128)], observed: u64) -> PowerLedger {
        let mut power = PowerLedger::new();
        let mut total = 0u128;
        for (holder, balance) in holders {
            power
                .record_balance_change(holder, TokenAmount::ZERO, amt(*balance), pt(1))
                .unwrap();
            total += balance;
        }
        power.record_total_power(amt(total), pt(1));
        power.observe(pt(observed));
        power
    }

    fn short_params() -> GovernanceParams {
        GovernanceParams {
            voting_delay: 1,
            voting_period: 10,
            proposal_threshold: 0,
            quorum_numerator: 400,
        }
    }

    struct RecordingDispatcher {
        calls: Vec<usize>,
        fail_at: Option<usize>,
    }

    impl RecordingDispatcher {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                fail_at: None,
            }
        }

        fn failing_at(index: usize) -> Self {
            Self {
                calls: Vec::new(),
                fail_at: Some(index),
            }
        }
    }

    impl ActionDispatcher for RecordingDispatcher {
        fn dispatch(&mut self, index: usize, _action: &ProposalAction) -> Result<(), String> {
            if self.fail_at == Some(index) {
                return Err("target reverted".into());
            }
            self.calls.push(index);
            Ok(())
        }
    }

    #[test]
    fn test_create_assigns_monotonic_ids_and_window() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 5);

        let id1 = engine
            .create_proposal(&a, vec![action()], "first".into(), &power, pt(5))
            .unwrap();
        let id2 = engine
            .create_proposal(&a, vec![action()], "second".into(), &power, pt(5))
            .unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);

        let p = engine.proposal(id1).unwrap();
        assert_eq!(p.snapshot, pt(5));
        assert_eq!(p.start, pt(6));
        assert_eq!(p.end, pt(16));
        assert_eq!(p.eta, None);
    }

    #[test]
    fn test_create_rejects_empty_and_oversized_action_lists() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 5);

        assert!(matches!(
            engine.create_proposal(&a, vec![], "none".into(), &power, pt(5)),
            Err(GovernanceError::InvalidParameters { .. })
        ));
        let too_many = vec![action(); MAX_PROPOSAL_ACTIONS + 1];
        assert!(matches!(
            engine.create_proposal(&a, too_many, "many".into(), &power, pt(5)),
            Err(GovernanceError::InvalidParameters { .. })
        ));
        assert_eq!(engine.proposal_count(), 0);
    }

    #[test]
    fn test_create_rejects_ownership_transfer_selector() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 5);

        let mut payload = crate::action::OWNERSHIP_TRANSFER_SELECTOR.to_vec();
        payload.extend_from_slice(&[0u8; 32]);
        let forbidden = ProposalAction {
            target: account(50),
            value: TokenAmount::ZERO,
            payload,
        };
        let err = engine
            .create_proposal(&a, vec![action(), forbidden], "sneaky".into(), &power, pt(5))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameters { .. }));
        // Rejected before any state was written.
        assert_eq!(engine.proposal_count(), 0);
    }

    #[test]
    fn test_proposal_threshold_enforced() {
        let mut engine = GovernanceEngine::new(GovernanceParams {
            proposal_threshold: 500,
            ..short_params()
        });
        let poor = account(1);
        let rich = account(2);
        let power = power_with(&[(poor, 499), (rich, 500)], 5);

        let err = engine
            .create_proposal(&poor, vec![action()], "p".into(), &power, pt(5))
            .unwrap_err();
        assert_eq!(err, GovernanceError::BelowProposalThreshold { have: 499, need: 500 });
        assert!(engine
            .create_proposal(&rich, vec![action()], "r".into(), &power, pt(5))
            .is_ok());
    }

    #[test]
    fn test_vote_window_boundaries() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        // Window is [6, 16]; before start:
        let early = engine.cast_vote(&a, id, VoteSupport::For, &power, pt(5));
        assert_eq!(early.unwrap_err(), GovernanceError::VotingClosed);
        // Exactly at end succeeds.
        let weight = engine
            .cast_vote(&a, id, VoteSupport::For, &power, pt(16))
            .unwrap();
        assert_eq!(weight, amt(1_000));
        // One point after end fails.
        let late = engine.cast_vote(&account(2), id, VoteSupport::For, &power, pt(17));
        assert_eq!(late.unwrap_err(), GovernanceError::VotingClosed);
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();

        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();
        let err = engine
            .cast_vote(&a, id, VoteSupport::Against, &power, pt(8))
            .unwrap_err();
        assert_eq!(err, GovernanceError::AlreadyVoted(a));
        // The tally is unchanged by the failed second vote.
        assert_eq!(engine.tallies(id).unwrap().0, amt(1_000));
        assert_eq!(engine.tallies(id).unwrap().1, TokenAmount::ZERO);
    }

    #[test]
    fn test_zero_power_vote_rejected() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let nobody = account(9);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();

        let err = engine
            .cast_vote(&nobody, id, VoteSupport::For, &power, pt(7))
            .unwrap_err();
        assert_eq!(err, GovernanceError::NoVotingPower);
        assert!(!engine.has_voted(id, &nobody));
    }

    #[test]
    fn test_weight_is_snapshot_power_not_current() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let b = account(2);
        let mut power = power_with(&[(a, 1_000)], 5);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();

        // After the snapshot, A hands everything to B.
        power
            .record_balance_change(&a, amt(1_000), TokenAmount::ZERO, pt(6))
            .unwrap();
        power
            .record_balance_change(&b, TokenAmount::ZERO, amt(1_000), pt(6))
            .unwrap();
        power.observe(pt(10));

        // A still votes with snapshot weight; B has none at the snapshot.
        let weight = engine
            .cast_vote(&a, id, VoteSupport::For, &power, pt(7))
            .unwrap();
        assert_eq!(weight, amt(1_000));
        let err = engine
            .cast_vote(&b, id, VoteSupport::For, &power, pt(7))
            .unwrap_err();
        assert_eq!(err, GovernanceError::NoVotingPower);
    }

    #[test]
    fn test_cancel_idempotence_and_authorization() {
        let mut engine = GovernanceEngine::new(short_params());
        let owner = account(1);
        let proposer = account(2);
        let roles = RoleRegistry::new(owner);
        let power = power_with(&[(proposer, 1_000)], 5);
        let id = engine
            .create_proposal(&proposer, vec![action()], "p".into(), &power, pt(5))
            .unwrap();

        // A stranger may not cancel.
        assert_eq!(
            engine.cancel(&account(9), id, &roles),
            Err(GovernanceError::Unauthorized)
        );
        // The proposer may.
        engine.cancel(&proposer, id, &roles).unwrap();
        // The second cancel fails with ProposalFinalized.
        assert_eq!(
            engine.cancel(&proposer, id, &roles),
            Err(GovernanceError::ProposalFinalized(id))
        );
        let (f, a_, ab) = engine.tallies(id).unwrap();
        assert_eq!((f, a_, ab), (TokenAmount::ZERO, TokenAmount::ZERO, TokenAmount::ZERO));
    }

    #[test]
    fn test_owner_can_cancel_foreign_proposal() {
        let mut engine = GovernanceEngine::new(short_params());
        let owner = account(1);
        let proposer = account(2);
        let roles = RoleRegistry::new(owner);
        let power = power_with(&[(proposer, 1_000)], 5);
        let id = engine
            .create_proposal(&proposer, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cancel(&owner, id, &roles).unwrap();
        assert!(engine.proposal(id).unwrap().canceled);
    }

    #[test]
    fn test_queue_requires_closed_window() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();

        // Still inside the window.
        assert_eq!(
            engine.queue(id, &power, pt(16), ts(100)),
            Err(GovernanceError::NotPassed)
        );
        // One point past the end it queues.
        let eta = engine.queue(id, &power, pt(17), ts(100)).unwrap();
        assert_eq!(eta, ts(100 + MIN_EXECUTION_DELAY_SECS));
        // Re-queueing is rejected.
        assert_eq!(
            engine.queue(id, &power, pt(18), ts(101)),
            Err(GovernanceError::AlreadyQueued)
        );
    }

    #[test]
    fn test_queue_quorum_boundary() {
        // Total supply 1_000_000, quorum 400/10_000 → 40_000.
        let holder = account(1);
        let rest = account(2);

        // Exactly at quorum: succeeds.
        let mut engine = GovernanceEngine::new(short_params());
        let power = power_with(&[(holder, 40_000), (rest, 960_000)], 40);
        let id = engine
            .create_proposal(&holder, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine
            .cast_vote(&holder, id, VoteSupport::For, &power, pt(7))
            .unwrap();
        assert!(engine.queue(id, &power, pt(17), ts(0)).is_ok());

        // One unit below quorum: fails.
        let mut engine = GovernanceEngine::new(short_params());
        let power = power_with(&[(holder, 39_999), (rest, 960_001)], 40);
        let id = engine
            .create_proposal(&holder, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine
            .cast_vote(&holder, id, VoteSupport::For, &power, pt(7))
            .unwrap();
        assert_eq!(
            engine.queue(id, &power, pt(17), ts(0)),
            Err(GovernanceError::QuorumNotMet {
                have: 39_999,
                need: 40_000,
            })
        );
    }

    #[test]
    fn test_tie_is_defeated_and_distinguishable() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let b = account(2);
        let power = power_with(&[(a, 500_000), (b, 500_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();
        engine
            .cast_vote(&b, id, VoteSupport::Against, &power, pt(7))
            .unwrap();

        assert_eq!(
            engine.queue(id, &power, pt(17), ts(0)),
            Err(GovernanceError::NotPassed)
        );
        assert_eq!(
            engine.defeat_reason(id, &power, pt(17)).unwrap(),
            Some(DefeatReason::NotCarried)
        );
        assert_eq!(
            engine.status(id, &power, pt(17), ts(0)).unwrap(),
            ProposalStatus::Defeated
        );
    }

    #[test]
    fn test_low_turnout_defeat_reason() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let whale = account(2);
        let power = power_with(&[(a, 100), (whale, 999_900)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();

        assert_eq!(
            engine.defeat_reason(id, &power, pt(17)).unwrap(),
            Some(DefeatReason::QuorumNotReached)
        );
        assert_eq!(
            engine.status(id, &power, pt(17), ts(0)).unwrap(),
            ProposalStatus::Defeated
        );
    }

    #[test]
    fn test_execute_happy_path_and_timelock() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(
                &a,
                vec![action(), action()],
                "p".into(),
                &power,
                pt(5),
            )
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();
        let eta = engine.queue(id, &power, pt(17), ts(1_000)).unwrap();

        let mut dispatcher = RecordingDispatcher::new();
        // Before eta: TimelockNotElapsed.
        let before = eta.as_secs() - 1;
        assert_eq!(
            engine.execute(id, ts(before), &mut dispatcher),
            Err(GovernanceError::TimelockNotElapsed { eta, now: ts(before) })
        );
        assert!(dispatcher.calls.is_empty());

        // At eta: all actions run in order.
        engine.execute(id, eta, &mut dispatcher).unwrap();
        assert_eq!(dispatcher.calls, vec![0, 1]);
        assert!(engine.proposal(id).unwrap().executed);
        assert_eq!(
            engine.status(id, &power, pt(18), eta).unwrap(),
            ProposalStatus::Executed
        );

        // Re-execution fails uniformly.
        assert_eq!(
            engine.execute(id, eta, &mut dispatcher),
            Err(GovernanceError::ProposalFinalized(id))
        );
    }

    #[test]
    fn test_execute_unqueued_rejected() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        let mut dispatcher = RecordingDispatcher::new();
        assert_eq!(
            engine.execute(id, ts(0), &mut dispatcher),
            Err(GovernanceError::NotQueued)
        );
    }

    #[test]
    fn test_execute_expiry_window() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();
        let eta = engine.queue(id, &power, pt(17), ts(0)).unwrap();
        let deadline = eta.plus_secs(MAX_EXECUTION_DELAY_SECS);

        let mut dispatcher = RecordingDispatcher::new();
        let late = deadline.plus_secs(1);
        assert_eq!(
            engine.execute(id, late, &mut dispatcher),
            Err(GovernanceError::ExecutionExpired { deadline, now: late })
        );
        assert_eq!(
            engine.status(id, &power, pt(18), late).unwrap(),
            ProposalStatus::Expired
        );
        // Exactly at the deadline still executes.
        engine.execute(id, deadline, &mut dispatcher).unwrap();
    }

    #[test]
    fn test_failed_action_aborts_atomically() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(
                &a,
                vec![action(), action(), action()],
                "p".into(),
                &power,
                pt(5),
            )
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();
        let eta = engine.queue(id, &power, pt(17), ts(0)).unwrap();

        let mut dispatcher = RecordingDispatcher::failing_at(1);
        let err = engine.execute(id, eta, &mut dispatcher).unwrap_err();
        assert_eq!(
            err,
            GovernanceError::ActionFailed {
                index: 1,
                reason: "target reverted".into(),
            }
        );
        // Not marked executed; a later retry with a working dispatcher runs.
        assert!(!engine.proposal(id).unwrap().executed);
        let mut retry = RecordingDispatcher::new();
        engine.execute(id, eta, &mut retry).unwrap();
        assert_eq!(retry.calls, vec![0, 1, 2]);
    }

    #[test]
    fn test_vote_on_finalized_proposal_rejected() {
        let mut engine = GovernanceEngine::new(short_params());
        let owner = account(1);
        let roles = RoleRegistry::new(owner);
        let power = power_with(&[(owner, 1_000)], 40);
        let id = engine
            .create_proposal(&owner, vec![action()], "p".into(), &power, pt(5))
            .unwrap();
        engine.cancel(&owner, id, &roles).unwrap();
        assert_eq!(
            engine.cast_vote(&owner, id, VoteSupport::For, &power, pt(7)),
            Err(GovernanceError::ProposalFinalized(id))
        );
        assert_eq!(
            engine.queue(id, &power, pt(17), ts(0)),
            Err(GovernanceError::ProposalFinalized(id))
        );
    }

    #[test]
    fn test_unknown_proposal_errors() {
        let mut engine = GovernanceEngine::new(short_params());
        let power = power_with(&[(account(1), 1_000)], 40);
        assert_eq!(
            engine.cast_vote(&account(1), 42, VoteSupport::For, &power, pt(7)),
            Err(GovernanceError::NoSuchProposal(42))
        );
        assert_eq!(
            engine.actions(42).unwrap_err(),
            GovernanceError::NoSuchProposal(42)
        );
    }

    #[test]
    fn test_set_params_owner_gated_and_validated() {
        let mut engine = GovernanceEngine::new(short_params());
        let owner = account(1);
        let roles = RoleRegistry::new(owner);

        assert_eq!(
            engine.set_params(&account(9), &roles, short_params()),
            Err(GovernanceError::Unauthorized)
        );
        let bad = GovernanceParams {
            quorum_numerator: 20_000,
            ..short_params()
        };
        assert!(engine.set_params(&owner, &roles, bad).is_err());

        let good = GovernanceParams {
            quorum_numerator: 2_000,
            ..short_params()
        };
        engine.set_params(&owner, &roles, good).unwrap();
        assert_eq!(engine.params().quorum_numerator, 2_000);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = GovernanceEngine::new(short_params());
        let a = account(1);
        let power = power_with(&[(a, 1_000)], 40);
        let id = engine
            .create_proposal(&a, vec![action()], "persisted".into(), &power, pt(5))
            .unwrap();
        engine.cast_vote(&a, id, VoteSupport::For, &power, pt(7)).unwrap();

        let restored = GovernanceEngine::load_state(&engine.save_state());
        assert_eq!(restored.proposal_count(), 1);
        assert!(restored.has_voted(id, &a));
        assert_eq!(restored.tallies(id).unwrap().0, amt(1_000));
        assert_eq!(restored.proposal(id).unwrap().description, "persisted");
        // The next id is preserved, so ids stay monotone across restarts.
        let mut restored = restored;
        let next = restored
            .create_proposal(&a, vec![action()], "after".into(), &power, pt(8))
            .unwrap();
        assert_eq!(next, id + 1);
    }
}
