use covenant_types::AccountId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("account {0} is blacklisted")]
    Blacklisted(AccountId),

    #[error("transfers are paused")]
    Paused,

    #[error("transfers are restricted to the designated counterparty and allow-listed accounts")]
    RestrictedTransfer,

    #[error("caller lacks the required capability")]
    Unauthorized,

    #[error("invalid parameters: {reason}")]
    InvalidParameters { reason: String },
}
