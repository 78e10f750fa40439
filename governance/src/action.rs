//! Follow-on actions and the dispatch boundary.

use serde::{Deserialize, Serialize};

use covenant_types::{AccountId, TokenAmount};

/// Call selector of the privileged ownership-transfer operation.
///
/// Governance may never carry an action with this selector: it would let a
/// proposal vote the engine into owning itself. Checked at creation and
/// re-checked at execution.
pub const OWNERSHIP_TRANSFER_SELECTOR: [u8; 4] = [0xf2, 0xfd, 0xe3, 0x8b];

/// One follow-on call a successful proposal performs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalAction {
    /// The account (contract) the call is directed at.
    pub target: AccountId,
    /// Token value attached to the call.
    pub value: TokenAmount,
    /// Opaque call data; the first four bytes select the operation.
    pub payload: Vec<u8>,
}

impl ProposalAction {
    /// The payload's leading four bytes, if present.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.payload.get(..4).map(|b| {
            let mut selector = [0u8; 4];
            selector.copy_from_slice(b);
            selector
        })
    }

    /// Whether this action encodes the forbidden ownership transfer.
    pub fn is_ownership_transfer(&self) -> bool {
        self.selector() == Some(OWNERSHIP_TRANSFER_SELECTOR)
    }
}

/// The single controlled boundary through which queued actions are invoked.
///
/// Implementations perform the outbound call and report success or failure;
/// the engine aborts the whole execution at the first failure, surfacing
/// the action index and the returned reason. Outbound targets may attempt
/// to call back into guarded entry points; the engine's reentrancy guard
/// rejects that.
pub trait ActionDispatcher {
    /// Perform one action. The error string becomes the failure reason in
    /// [`GovernanceError::ActionFailed`].
    ///
    /// [`GovernanceError::ActionFailed`]: crate::error::GovernanceError::ActionFailed
    fn dispatch(&mut self, index: usize, action: &ProposalAction) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(payload: Vec<u8>) -> ProposalAction {
        ProposalAction {
            target: AccountId::new([7; 32]),
            value: TokenAmount::ZERO,
            payload,
        }
    }

    #[test]
    fn test_selector_extraction() {
        assert_eq!(action(vec![]).selector(), None);
        assert_eq!(action(vec![1, 2, 3]).selector(), None);
        assert_eq!(action(vec![1, 2, 3, 4]).selector(), Some([1, 2, 3, 4]));
        assert_eq!(action(vec![1, 2, 3, 4, 5]).selector(), Some([1, 2, 3, 4]));
    }

    #[test]
    fn test_ownership_transfer_detection() {
        let mut payload = OWNERSHIP_TRANSFER_SELECTOR.to_vec();
        payload.extend_from_slice(&[0u8; 32]);
        assert!(action(payload).is_ownership_transfer());
        assert!(!action(vec![0, 0, 0, 0]).is_ownership_transfer());
        assert!(!action(vec![]).is_ownership_transfer());
    }
}
