//! Fundamental types for the Covenant token engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account identifiers, token amounts, sequence points, and
//! timestamps.

pub mod account;
pub mod amount;
pub mod sequence;
pub mod time;

pub use account::AccountId;
pub use amount::TokenAmount;
pub use sequence::SequencePoint;
pub use time::Timestamp;
