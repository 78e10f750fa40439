//! Owner and operator capability registry.

use crate::error::PolicyError;
use covenant_types::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A narrow capability grantable to accounts other than the owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May grant and revoke blacklist status.
    BlacklistOperator,
    /// May process bridge requests (the bridge subsystem itself is external).
    BridgeOperator,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BlacklistOperator => "blacklist_operator",
            Self::BridgeOperator => "bridge_operator",
        }
    }
}

/// Explicit authorization table: one owner, plus per-role operator sets.
///
/// Every capability-gated operation queries this table with the caller's
/// identity; nothing is inherited.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleRegistry {
    owner: AccountId,
    operators: HashMap<Role, HashSet<AccountId>>,
}

impl RoleRegistry {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            operators: HashMap::new(),
        }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn is_owner(&self, account: &AccountId) -> bool {
        self.owner == *account
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &AccountId) -> Result<(), PolicyError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(PolicyError::Unauthorized)
        }
    }

    pub fn has_role(&self, role: Role, account: &AccountId) -> bool {
        self.operators
            .get(&role)
            .is_some_and(|set| set.contains(account))
    }

    /// Owner, or an operator holding `role`.
    pub fn is_owner_or(&self, role: Role, account: &AccountId) -> bool {
        self.is_owner(account) || self.has_role(role, account)
    }

    /// Grant `role` to `account`. Owner only.
    pub fn grant_role(
        &mut self,
        caller: &AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<(), PolicyError> {
        self.require_owner(caller)?;
        if account.is_null() {
            return Err(PolicyError::InvalidParameters {
                reason: "cannot grant a role to the null account".into(),
            });
        }
        self.operators.entry(role).or_default().insert(account);
        tracing::info!(role = role.name(), account = %account, "role granted");
        Ok(())
    }

    /// Revoke `role` from `account`. Owner only.
    pub fn revoke_role(
        &mut self,
        caller: &AccountId,
        role: Role,
        account: &AccountId,
    ) -> Result<(), PolicyError> {
        self.require_owner(caller)?;
        if let Some(set) = self.operators.get_mut(&role) {
            set.remove(account);
            if set.is_empty() {
                self.operators.remove(&role);
            }
        }
        tracing::info!(role = role.name(), account = %account, "role revoked");
        Ok(())
    }

    /// Hand the owner identity to `new_owner`. Owner only.
    ///
    /// This is the privileged operation that governance actions are
    /// forbidden from encoding.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), PolicyError> {
        self.require_owner(caller)?;
        if new_owner.is_null() {
            return Err(PolicyError::InvalidParameters {
                reason: "cannot transfer ownership to the null account".into(),
            });
        }
        tracing::info!(old = %self.owner, new = %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }
}
