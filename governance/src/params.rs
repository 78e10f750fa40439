//! Governance parameters with TOML file support.

use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};

/// Denominator for the quorum fraction: `quorum_numerator / 10_000` of the
/// historical total supply must turn out for a proposal to be queueable.
pub const QUORUM_DENOMINATOR: u128 = 10_000;

/// Mandatory delay between queueing and execution eligibility (14 days).
pub const MIN_EXECUTION_DELAY_SECS: u64 = 14 * 24 * 60 * 60;

/// Width of the execution window after `eta`; past it the proposal expires.
pub const MAX_EXECUTION_DELAY_SECS: u64 = 14 * 24 * 60 * 60;

/// Upper bound on the number of actions a single proposal may carry.
pub const MAX_PROPOSAL_ACTIONS: usize = 10;

/// Tunable voting parameters.
///
/// Can be loaded from a TOML file via [`GovernanceParams::from_toml_str`]
/// or built programmatically (e.g. for tests). Out-of-range values are
/// rejected by [`GovernanceParams::validate`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Sequence points between a proposal's snapshot and the start of its
    /// voting window.
    #[serde(default = "default_voting_delay")]
    pub voting_delay: u64,

    /// Length of the voting window in sequence points.
    #[serde(default = "default_voting_period")]
    pub voting_period: u64,

    /// Minimum voting power a proposer must hold one point before creating
    /// a proposal.
    #[serde(default)]
    pub proposal_threshold: u64,

    /// Quorum numerator over [`QUORUM_DENOMINATOR`].
    #[serde(default = "default_quorum_numerator")]
    pub quorum_numerator: u32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_voting_delay() -> u64 {
    1
}

fn default_voting_period() -> u64 {
    17_280
}

fn default_quorum_numerator() -> u32 {
    400
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_delay: default_voting_delay(),
            voting_period: default_voting_period(),
            proposal_threshold: 0,
            quorum_numerator: default_quorum_numerator(),
        }
    }
}

impl GovernanceParams {
    /// Parse parameters from TOML, applying defaults for absent keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, GovernanceError> {
        let params: Self =
            toml::from_str(contents).map_err(|e| GovernanceError::InvalidParameters {
                reason: format!("failed to parse governance params: {e}"),
            })?;
        params.validate()?;
        Ok(params)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.voting_period == 0 {
            return Err(GovernanceError::InvalidParameters {
                reason: "voting_period must be at least 1".into(),
            });
        }
        if u128::from(self.quorum_numerator) > QUORUM_DENOMINATOR {
            return Err(GovernanceError::InvalidParameters {
                reason: format!(
                    "quorum_numerator {} exceeds denominator {}",
                    self.quorum_numerator, QUORUM_DENOMINATOR
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        GovernanceParams::default().validate().unwrap();
    }

    #[test]
    fn test_from_toml_with_defaults() {
        let params = GovernanceParams::from_toml_str("").unwrap();
        assert_eq!(params.voting_delay, 1);
        assert_eq!(params.voting_period, 17_280);
        assert_eq!(params.proposal_threshold, 0);
        assert_eq!(params.quorum_numerator, 400);
    }

    #[test]
    fn test_from_toml_overrides() {
        let params = GovernanceParams::from_toml_str(
            r#"
            voting_delay = 5
            voting_period = 100
            proposal_threshold = 1000
            quorum_numerator = 2500
            "#,
        )
        .unwrap();
        assert_eq!(params.voting_delay, 5);
        assert_eq!(params.voting_period, 100);
        assert_eq!(params.proposal_threshold, 1_000);
        assert_eq!(params.quorum_numerator, 2_500);
    }

    #[test]
    fn test_zero_voting_period_rejected() {
        let err = GovernanceParams::from_toml_str("voting_period = 0").unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameters { .. }));
    }

    #[test]
    fn test_quorum_numerator_over_denominator_rejected() {
        let err = GovernanceParams::from_toml_str("quorum_numerator = 10001").unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidParameters { .. }));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(GovernanceParams::from_toml_str("voting_delay = \"soon\"").is_err());
    }
}
