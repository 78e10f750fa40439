use covenant_checkpoints::CheckpointError;
use covenant_policy::PolicyError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("the null account cannot participate in this operation")]
    ZeroAddress,

    #[error("supply cap exceeded: minting would bring supply to {requested}, cap is {cap}")]
    SupplyCapExceeded { requested: u128, cap: u128 },

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("caller lacks the required capability")]
    Unauthorized,

    #[error("balance arithmetic overflow")]
    Overflow,

    #[error("transfer denied: {0}")]
    Policy(#[from] PolicyError),

    #[error("power ledger error: {0}")]
    Power(#[from] CheckpointError),
}
