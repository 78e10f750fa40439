//! Transfer gating policy for the covenant token.
//!
//! Given a proposed value movement and the current policy state, the gate
//! decides allow or deny. Rule order is load-bearing: blacklist checks run
//! before mode checks, so a blacklisted account cannot escape denial by
//! being the restricted-mode counterparty.
//!
//! The crate also hosts the role registry — a single owner plus narrow
//! operator roles, modeled as an explicit authorization table rather than
//! privileged base types.

pub mod error;
pub mod gate;
pub mod roles;

pub use error::PolicyError;
pub use gate::{TransferKind, TransferPolicy, TransferPolicySnapshot, MAX_ALLOW_LIST_BATCH};
pub use roles::{Role, RoleRegistry};
