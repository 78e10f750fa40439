//! The power ledger — per-account and global checkpoint histories plus the
//! delegation table.

use crate::error::CheckpointError;
use crate::history::CheckpointHistory;
use covenant_types::{AccountId, SequencePoint, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tracks historical voting power for every account and for the total
/// supply, with the same snapshot discipline for both.
///
/// Accounts are self-delegated by default, so an account's power equals its
/// balance until it delegates. A delegation routes the account's full
/// balance-weight to the delegate; subsequent balance changes follow it.
///
/// The balance-owning side (the token ledger) is the only writer; readers
/// query through [`PowerLedger::power_at`] and
/// [`PowerLedger::total_power_at`].
pub struct PowerLedger {
    /// Per-account power histories, keyed by the power holder (delegate).
    accounts: HashMap<AccountId, CheckpointHistory>,
    /// Historical total supply, the quorum denominator.
    total: CheckpointHistory,
    /// Explicit delegations: account → delegate. Absent means self.
    delegates: HashMap<AccountId, AccountId>,
    /// Highest sequence point observed; queries at or past it are not yet
    /// finalized.
    current: SequencePoint,
}

impl PowerLedger {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            total: CheckpointHistory::new(),
            delegates: HashMap::new(),
            current: SequencePoint::GENESIS,
        }
    }

    /// Advance the finalization horizon to `at`.
    ///
    /// Every recording operation does this implicitly; environments that
    /// advance the global sequence without token traffic call it directly.
    pub fn observe(&mut self, at: SequencePoint) {
        if at > self.current {
            self.current = at;
        }
    }

    /// The highest sequence point observed so far.
    pub fn current_point(&self) -> SequencePoint {
        self.current
    }

    /// The account whose history receives `account`'s balance-weight.
    pub fn delegate_of(&self, account: &AccountId) -> AccountId {
        self.delegates.get(account).copied().unwrap_or(*account)
    }

    /// Apply a balance change to the affected account's resolved delegate.
    ///
    /// Must be called for every endpoint of every balance mutation, in the
    /// same atomic step as the mutation itself.
    pub fn record_balance_change(
        &mut self,
        account: &AccountId,
        old_balance: TokenAmount,
        new_balance: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), CheckpointError> {
        let delegate = self.delegate_of(account);
        let history = self.accounts.entry(delegate).or_default();
        let power = history
            .latest()
            .checked_sub(old_balance)
            .and_then(|p| p.checked_add(new_balance))
            .ok_or(CheckpointError::Overflow)?;
        history.record(at, power);
        self.observe(at);
        Ok(())
    }

    /// Checkpoint the total supply after a mint or burn.
    pub fn record_total_power(&mut self, total_supply: TokenAmount, at: SequencePoint) {
        self.total.record(at, total_supply);
        self.observe(at);
    }

    /// Redirect `account`'s balance-weight to `delegate`.
    ///
    /// Delegating to self removes the indirection. The caller supplies the
    /// account's current balance, which is the weight that moves.
    pub fn set_delegate(
        &mut self,
        account: &AccountId,
        delegate: &AccountId,
        balance: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), CheckpointError> {
        let old = self.delegate_of(account);
        if old == *delegate {
            return Ok(());
        }

        let old_history = self.accounts.entry(old).or_default();
        let reduced = old_history
            .latest()
            .checked_sub(balance)
            .ok_or(CheckpointError::Overflow)?;
        old_history.record(at, reduced);

        let new_history = self.accounts.entry(*delegate).or_default();
        let raised = new_history
            .latest()
            .checked_add(balance)
            .ok_or(CheckpointError::Overflow)?;
        new_history.record(at, raised);

        if *delegate == *account {
            self.delegates.remove(account);
        } else {
            self.delegates.insert(*account, *delegate);
        }
        self.observe(at);
        tracing::debug!(account = %account, delegate = %delegate, at = %at, "delegation updated");
        Ok(())
    }

    /// The account's power as of `point`.
    ///
    /// Fails with `FutureQuery` when `point` is not yet finalized.
    pub fn power_at(
        &self,
        account: &AccountId,
        point: SequencePoint,
    ) -> Result<TokenAmount, CheckpointError> {
        self.check_finalized(point)?;
        Ok(self
            .accounts
            .get(account)
            .map_or(TokenAmount::ZERO, |h| h.value_at(point)))
    }

    /// The total supply as of `point` — the quorum denominator.
    pub fn total_power_at(&self, point: SequencePoint) -> Result<TokenAmount, CheckpointError> {
        self.check_finalized(point)?;
        Ok(self.total.value_at(point))
    }

    /// The account's power right now (projection, no snapshot discipline).
    pub fn latest_power(&self, account: &AccountId) -> TokenAmount {
        self.accounts
            .get(account)
            .map_or(TokenAmount::ZERO, |h| h.latest())
    }

    /// Number of checkpoints recorded for an account.
    pub fn checkpoint_count(&self, account: &AccountId) -> usize {
        self.accounts.get(account).map_or(0, |h| h.len())
    }

    fn check_finalized(&self, point: SequencePoint) -> Result<(), CheckpointError> {
        if point >= self.current {
            return Err(CheckpointError::FutureQuery {
                queried: point,
                current: self.current,
            });
        }
        Ok(())
    }
}

impl Default for PowerLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Meta-store key used for persisting the power ledger state.
const POWER_LEDGER_META_KEY: &str = "power_ledger_state";

/// Serializable snapshot of the power ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerLedgerSnapshot {
    pub accounts: HashMap<AccountId, CheckpointHistory>,
    pub total: CheckpointHistory,
    pub delegates: HashMap<AccountId, AccountId>,
    pub current: SequencePoint,
}

impl PowerLedger {
    /// Serialize the ledger to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = PowerLedgerSnapshot {
            accounts: self.accounts.clone(),
            total: self.total.clone(),
            delegates: self.delegates.clone(),
            current: self.current,
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore the ledger from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        match bincode::deserialize::<PowerLedgerSnapshot>(data) {
            Ok(snapshot) => Self {
                accounts: snapshot.accounts,
                total: snapshot.total,
                delegates: snapshot.delegates,
                current: snapshot.current,
            },
            Err(_) => Self::new(),
        }
    }

    /// The meta-store key used for power ledger persistence.
    pub fn meta_key() -> &'static str {
        POWER_LEDGER_META_KEY
    }
}
