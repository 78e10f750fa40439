//! The transfer gate — allow/deny decisions for value movements.

use crate::error::PolicyError;
use crate::roles::{Role, RoleRegistry};
use covenant_types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of entries a single allow-list batch update may carry.
pub const MAX_ALLOW_LIST_BATCH: usize = 200;

/// What kind of balance movement is being evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferKind {
    /// Supply issuance; the sender side is the null account.
    Mint,
    /// Supply destruction; the receiver side is the null account.
    Burn,
    /// An ordinary account-to-account movement.
    Transfer,
}

/// Policy state consulted before every balance mutation.
///
/// At most one restrictive mode is meaningfully active at a time; pause
/// takes precedence over restricted mode.
#[derive(Clone, Debug, Default)]
pub struct TransferPolicy {
    /// Accounts denied all transfer participation.
    blacklist: HashSet<AccountId>,
    /// Accounts exempted from restricted mode, on either end.
    allow_list: HashSet<AccountId>,
    /// When set, ordinary transfers must involve this counterparty as
    /// sender or an allow-listed endpoint.
    restricted_counterparty: Option<AccountId>,
    /// When true, every movement is denied.
    paused: bool,
}

impl TransferPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a movement may proceed. `Ok(())` is allow; the error
    /// is the deny reason, surfaced unchanged to the caller.
    ///
    /// Rule order is load-bearing: blacklist before pause before mode, so a
    /// blacklisted account is denied as `Blacklisted` even when it is the
    /// designated counterparty or the system is paused.
    pub fn evaluate(
        &self,
        from: &AccountId,
        to: &AccountId,
        kind: TransferKind,
    ) -> Result<(), PolicyError> {
        if kind != TransferKind::Mint && self.blacklist.contains(from) {
            return Err(PolicyError::Blacklisted(*from));
        }
        if kind != TransferKind::Burn && self.blacklist.contains(to) {
            return Err(PolicyError::Blacklisted(*to));
        }

        if self.paused {
            return Err(PolicyError::Paused);
        }

        if kind == TransferKind::Transfer {
            if let Some(counterparty) = &self.restricted_counterparty {
                let allowed = from == counterparty
                    || self.allow_list.contains(from)
                    || self.allow_list.contains(to);
                if !allowed {
                    return Err(PolicyError::RestrictedTransfer);
                }
            }
        }

        Ok(())
    }

    /// Add or remove `account` from the blacklist. Owner or blacklist
    /// operator; effective immediately for all subsequent evaluations.
    pub fn set_blacklist(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        account: AccountId,
        denied: bool,
    ) -> Result<(), PolicyError> {
        if !roles.is_owner_or(Role::BlacklistOperator, caller) {
            return Err(PolicyError::Unauthorized);
        }
        if account.is_null() {
            return Err(PolicyError::InvalidParameters {
                reason: "cannot blacklist the null account".into(),
            });
        }
        if denied {
            self.blacklist.insert(account);
        } else {
            self.blacklist.remove(&account);
        }
        tracing::info!(account = %account, denied, "blacklist updated");
        Ok(())
    }

    /// Add or remove a single allow-list entry. Owner only.
    pub fn set_allow_list_entry(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        account: AccountId,
        allowed: bool,
    ) -> Result<(), PolicyError> {
        roles.require_owner(caller)?;
        self.apply_allow_list_entry(account, allowed);
        Ok(())
    }

    /// Apply a batch of allow-list updates. Owner only; bounded batch size.
    pub fn set_allow_list_batch(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        entries: &[(AccountId, bool)],
    ) -> Result<(), PolicyError> {
        roles.require_owner(caller)?;
        if entries.is_empty() || entries.len() > MAX_ALLOW_LIST_BATCH {
            return Err(PolicyError::InvalidParameters {
                reason: format!(
                    "allow-list batch must contain between 1 and {} entries, got {}",
                    MAX_ALLOW_LIST_BATCH,
                    entries.len()
                ),
            });
        }
        for (account, allowed) in entries {
            self.apply_allow_list_entry(*account, *allowed);
        }
        Ok(())
    }

    fn apply_allow_list_entry(&mut self, account: AccountId, allowed: bool) {
        if allowed {
            self.allow_list.insert(account);
        } else {
            self.allow_list.remove(&account);
        }
        tracing::info!(account = %account, allowed, "allow-list updated");
    }

    /// Block or unblock every movement. Owner only.
    pub fn set_paused(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        paused: bool,
    ) -> Result<(), PolicyError> {
        roles.require_owner(caller)?;
        self.paused = paused;
        tracing::info!(paused, "pause toggled");
        Ok(())
    }

    /// Enter restricted mode with `counterparty` designated, or leave it
    /// with `None`. Owner only.
    pub fn set_restricted_counterparty(
        &mut self,
        caller: &AccountId,
        roles: &RoleRegistry,
        counterparty: Option<AccountId>,
    ) -> Result<(), PolicyError> {
        roles.require_owner(caller)?;
        if counterparty.is_some_and(|c| c.is_null()) {
            return Err(PolicyError::InvalidParameters {
                reason: "restricted counterparty cannot be the null account".into(),
            });
        }
        self.restricted_counterparty = counterparty;
        match &self.restricted_counterparty {
            Some(c) => tracing::info!(counterparty = %c, "restricted mode enabled"),
            None => tracing::info!("restricted mode disabled"),
        }
        Ok(())
    }

    pub fn is_blacklisted(&self, account: &AccountId) -> bool {
        self.blacklist.contains(account)
    }

    pub fn is_allow_listed(&self, account: &AccountId) -> bool {
        self.allow_list.contains(account)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn restricted_counterparty(&self) -> Option<AccountId> {
        self.restricted_counterparty
    }
}

/// Meta-store key used for persisting the transfer policy state.
const TRANSFER_POLICY_META_KEY: &str = "transfer_policy_state";

/// Serializable snapshot of the policy state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferPolicySnapshot {
    pub blacklist: HashSet<AccountId>,
    pub allow_list: HashSet<AccountId>,
    pub restricted_counterparty: Option<AccountId>,
    pub paused: bool,
}

impl TransferPolicy {
    /// Serialize the policy to bytes for persistence.
    pub fn save_state(&self) -> Vec<u8> {
        let snapshot = TransferPolicySnapshot {
            blacklist: self.blacklist.clone(),
            allow_list: self.allow_list.clone(),
            restricted_counterparty: self.restricted_counterparty,
            paused: self.paused,
        };
        bincode::serialize(&snapshot).unwrap_or_default()
    }

    /// Restore the policy from serialized bytes.
    pub fn load_state(data: &[u8]) -> Self {
        match bincode::deserialize::<TransferPolicySnapshot>(data) {
            Ok(snapshot) => Self {
                blacklist: snapshot.blacklist,
                allow_list: snapshot.allow_list,
                restricted_counterparty: snapshot.restricted_counterparty,
                paused: snapshot.paused,
            },
            Err(_) => Self::new(),
        }
    }

    /// The meta-store key used for policy persistence.
    pub fn meta_key() -> &'static str {
        TRANSFER_POLICY_META_KEY
    }
}
