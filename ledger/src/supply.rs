//! Supply counters with a hard cap.

use crate::error::LedgerError;
use covenant_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// Tracks minted and burned totals against an immutable cap.
///
/// Invariant: `total_supply() == total_minted - total_burned <= max_supply`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SupplyCounters {
    max_supply: TokenAmount,
    total_minted: TokenAmount,
    total_burned: TokenAmount,
}

impl SupplyCounters {
    pub fn new(max_supply: TokenAmount) -> Self {
        Self {
            max_supply,
            total_minted: TokenAmount::ZERO,
            total_burned: TokenAmount::ZERO,
        }
    }

    pub fn max_supply(&self) -> TokenAmount {
        self.max_supply
    }

    pub fn total_minted(&self) -> TokenAmount {
        self.total_minted
    }

    pub fn total_burned(&self) -> TokenAmount {
        self.total_burned
    }

    /// Current circulating supply.
    pub fn total_supply(&self) -> TokenAmount {
        // total_burned never exceeds total_minted: burns are bounded by
        // balances, which are bounded by mints.
        self.total_minted.saturating_sub(self.total_burned)
    }

    /// Fail if minting `amount` would exceed the cap, without mutating.
    pub fn check_mint(&self, amount: TokenAmount) -> Result<TokenAmount, LedgerError> {
        let requested = self
            .total_supply()
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if requested > self.max_supply {
            return Err(LedgerError::SupplyCapExceeded {
                requested: requested.raw(),
                cap: self.max_supply.raw(),
            });
        }
        self.total_minted
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)
    }

    /// Validate and record a mint of `amount`.
    pub fn record_mint(&mut self, amount: TokenAmount) -> Result<(), LedgerError> {
        self.total_minted = self.check_mint(amount)?;
        Ok(())
    }

    /// Record a burn of `amount`.
    pub fn record_burn(&mut self, amount: TokenAmount) -> Result<(), LedgerError> {
        self.total_burned = self
            .total_burned
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }
}
