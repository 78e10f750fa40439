//! The token ledger — balances, allowances, and gated mutations.

use crate::error::LedgerError;
use crate::supply::SupplyCounters;
use covenant_checkpoints::PowerLedger;
use covenant_policy::{RoleRegistry, TransferKind, TransferPolicy};
use covenant_types::{AccountId, SequencePoint, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Owns per-account balances and the supply counters.
///
/// The transfer policy is consulted before any mutation; on deny the whole
/// operation fails with the deny reason and no state changes. Every balance
/// mutation updates the power ledger for every affected endpoint in the
/// same step — a mutation that changed balance but not voting power (or
/// vice versa) would be an invariant violation.
pub struct TokenLedger {
    balances: HashMap<AccountId, TokenAmount>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(AccountId, AccountId), TokenAmount>,
    supply: SupplyCounters,
    policy: TransferPolicy,
    power: PowerLedger,
}

impl TokenLedger {
    pub fn new(max_supply: TokenAmount) -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            supply: SupplyCounters::new(max_supply),
            policy: TransferPolicy::new(),
            power: PowerLedger::new(),
        }
    }

    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.balances
            .get(account)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> TokenAmount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.supply.total_supply()
    }

    pub fn supply(&self) -> &SupplyCounters {
        &self.supply
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    /// Mutable access for administrative policy updates; the policy's own
    /// methods enforce capability checks.
    pub fn policy_mut(&mut self) -> &mut TransferPolicy {
        &mut self.policy
    }

    /// Read side of the voting-power ledger. The token ledger is the only
    /// writer.
    pub fn power(&self) -> &PowerLedger {
        &self.power
    }

    /// Advance the power ledger's finalization horizon without a balance
    /// mutation, for environments whose sequence progresses between token
    /// operations.
    pub fn advance_to(&mut self, at: SequencePoint) {
        self.power.observe(at);
    }

    /// Issue `amount` new units to `to`. Owner only; bounded by the cap.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        to: AccountId,
        amount: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        if !roles.is_owner(caller) {
            return Err(LedgerError::Unauthorized);
        }
        if to.is_null() {
            return Err(LedgerError::ZeroAddress);
        }
        self.policy.evaluate(&AccountId::NULL, &to, TransferKind::Mint)?;

        self.supply.check_mint(amount)?;
        let old_balance = self.balance_of(&to);
        let new_balance = old_balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.power
            .record_balance_change(&to, old_balance, new_balance, at)?;
        self.supply.record_mint(amount)?;
        self.power.record_total_power(self.supply.total_supply(), at);
        self.balances.insert(to, new_balance);

        tracing::info!(to = %to, amount = %amount, supply = %self.supply.total_supply(), "minted");
        Ok(())
    }

    /// Destroy `amount` units from the caller's own balance.
    pub fn burn(
        &mut self,
        from: &AccountId,
        amount: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        if from.is_null() {
            return Err(LedgerError::ZeroAddress);
        }
        self.policy
            .evaluate(from, &AccountId::NULL, TransferKind::Burn)?;

        let old_balance = self.balance_of(from);
        let new_balance = old_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount.raw(),
                available: old_balance.raw(),
            })?;

        self.power
            .record_balance_change(from, old_balance, new_balance, at)?;
        self.supply.record_burn(amount)?;
        self.power.record_total_power(self.supply.total_supply(), at);
        self.balances.insert(*from, new_balance);

        tracing::info!(from = %from, amount = %amount, supply = %self.supply.total_supply(), "burned");
        Ok(())
    }

    /// Destroy `amount` units from `from`, spending `spender`'s allowance.
    pub fn burn_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        amount: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        let remaining = self.spend_allowance_checked(from, spender, amount)?;
        self.burn(from, amount, at)?;
        self.allowances.insert((*from, *spender), remaining);
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        if from.is_null() || to.is_null() {
            return Err(LedgerError::ZeroAddress);
        }
        self.policy.evaluate(from, to, TransferKind::Transfer)?;

        let old_from = self.balance_of(from);
        let new_from = old_from
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                needed: amount.raw(),
                available: old_from.raw(),
            })?;
        let old_to = self.balance_of(to);
        let new_to = old_to.checked_add(amount).ok_or(LedgerError::Overflow)?;

        if from == to {
            self.power.observe(at);
            return Ok(());
        }

        self.power.record_balance_change(from, old_from, new_from, at)?;
        self.power.record_balance_change(to, old_to, new_to, at)?;
        self.balances.insert(*from, new_from);
        self.balances.insert(*to, new_to);

        tracing::debug!(from = %from, to = %to, amount = %amount, "transferred");
        Ok(())
    }

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: TokenAmount,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        let remaining = self.spend_allowance_checked(from, spender, amount)?;
        self.transfer(from, to, amount, at)?;
        self.allowances.insert((*from, *spender), remaining);
        Ok(())
    }

    /// Authorize `spender` to move up to `amount` of `owner`'s balance.
    ///
    /// This is the interface edge of the standard allowance bookkeeping;
    /// only what `transfer_from`/`burn_from` consume lives here.
    pub fn approve(
        &mut self,
        owner: &AccountId,
        spender: &AccountId,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        if owner.is_null() || spender.is_null() {
            return Err(LedgerError::ZeroAddress);
        }
        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    /// Redirect `account`'s voting power to `delegate`.
    pub fn delegate(
        &mut self,
        account: &AccountId,
        delegate: AccountId,
        at: SequencePoint,
    ) -> Result<(), LedgerError> {
        if account.is_null() || delegate.is_null() {
            return Err(LedgerError::ZeroAddress);
        }
        let balance = self.balance_of(account);
        self.power.set_delegate(account, &delegate, balance, at)?;
        Ok(())
    }

    /// Validate an allowance spend without committing it. Returns the
    /// allowance that remains once the surrounding operation succeeds.
    fn spend_allowance_checked(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: TokenAmount,
    ) -> Result<TokenAmount, LedgerError> {
        let available = self.allowance(owner, spender);
        available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance {
                needed: amount.raw(),
                available: available.raw(),
            })
    }

    /// Recompute the supply invariant from scratch: the sum of all balances
    /// must equal `total_minted - total_burned`, which must not exceed the
    /// cap. Verifies the incremental bookkeeping matches reality.
    pub fn audit_supply(&self) -> bool {
        let held: TokenAmount = self.balances.values().copied().sum();
        held == self.supply.total_supply() && held <= self.supply.max_supply()
    }
}

/// Meta-store key used for persisting the token ledger state.
const TOKEN_LEDGER_META_KEY: &str = "token_ledger_state";

/// Serializable snapshot of the full token ledger, embedding the policy and
/// power-ledger snapshots it owns.
#[derive(Serialize, Deserialize)]
pub struct TokenLedgerSnapshot {
    pub balances: HashMap<AccountId, TokenAmount>,
    pub allowances: HashMap<(AccountId, AccountId), TokenAmount>,
    pub supply: SupplyCounters,
    pub policy: Vec<u8>,
    pub power: Vec<u8>,
}

impl TokenLedger {
    /// Serialize the ledger (including policy and power state) to bytes.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = TokenLedgerSnapshot {
            balances: self.balances.clone(),
            allowances: self.allowances.clone(),
            supply: self.supply.clone(),
            policy: self.policy.save_state(),
            power: self.power.save_state(),
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore a ledger from serialized bytes. Falls back to an empty
    /// ledger with `max_supply` when the bytes do not parse.
    pub fn load_state(data: &[u8], max_supply: TokenAmount) -> Self {
        match bincode::deserialize::<TokenLedgerSnapshot>(data) {
            Ok(snapshot) => Self {
                balances: snapshot.balances,
                allowances: snapshot.allowances,
                supply: snapshot.supply,
                policy: TransferPolicy::load_state(&snapshot.policy),
                power: PowerLedger::load_state(&snapshot.power),
            },
            Err(_) => Self::new(max_supply),
        }
    }

    /// The meta-store key used for token ledger persistence.
    pub fn meta_key() -> &'static str {
        TOKEN_LEDGER_META_KEY
    }
}
