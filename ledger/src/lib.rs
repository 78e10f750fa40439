//! Token ledger for the covenant token.
//!
//! Owns balances, allowances, and the supply counters. Every
//! balance-changing operation passes through the transfer gate before any
//! mutation and updates the voting-power ledger for every affected account
//! in the same atomic step.

pub mod error;
pub mod supply;
pub mod token;

pub use error::LedgerError;
pub use supply::SupplyCounters;
pub use token::{TokenLedger, TokenLedgerSnapshot};
