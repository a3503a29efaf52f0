use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BADGE_THRESHOLD, DEFAULT_MAX_LOCK_DAYS, DEFAULT_MIN_LOCK_DAYS,
    DEFAULT_PLATFORM_FEE_BPS, DEFAULT_PROPOSAL_THRESHOLD, DEFAULT_QUORUM,
    DEFAULT_REWARD_RATE_BPS, DEFAULT_VERIFICATION_THRESHOLD, DEFAULT_VOTING_PERIOD_SECS,
    MAX_PLATFORM_FEE_BPS,
};
use crate::error::EcoCredError;
use crate::types::{Address, Amount};

/// How awarded credits are scaled by company reputation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReputationModel {
    /// Every company receives exactly the verified amount.
    #[default]
    Flat,
    /// Bonus multiplier by reputation tier.
    Tiered,
}

/// Tunable ledger parameters. Lives in ledger state so that governance
/// proposals can change it; genesis seeds it from JSON.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    pub verification_threshold: u32,
    pub badge_threshold: Amount,
    pub platform_fee_bps: u16,
    /// Receives marketplace fees. `None` = token owner.
    pub fee_recipient: Option<Address>,
    pub reward_rate_bps: u32,
    pub min_lock_days: u32,
    pub max_lock_days: u32,
    pub proposal_threshold: Amount,
    pub voting_period_secs: i64,
    pub quorum: Amount,
    pub reputation: ReputationModel,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verification_threshold: DEFAULT_VERIFICATION_THRESHOLD,
            badge_threshold: DEFAULT_BADGE_THRESHOLD,
            platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
            fee_recipient: None,
            reward_rate_bps: DEFAULT_REWARD_RATE_BPS,
            min_lock_days: DEFAULT_MIN_LOCK_DAYS,
            max_lock_days: DEFAULT_MAX_LOCK_DAYS,
            proposal_threshold: DEFAULT_PROPOSAL_THRESHOLD,
            voting_period_secs: DEFAULT_VOTING_PERIOD_SECS,
            quorum: DEFAULT_QUORUM,
            reputation: ReputationModel::Flat,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), EcoCredError> {
        if self.verification_threshold == 0 {
            return Err(EcoCredError::InvalidArgument(
                "verification threshold must be at least 1".into(),
            ));
        }
        if self.platform_fee_bps > MAX_PLATFORM_FEE_BPS {
            return Err(EcoCredError::InvalidArgument(format!(
                "platform fee exceeds {MAX_PLATFORM_FEE_BPS} bps"
            )));
        }
        if self.min_lock_days == 0 || self.min_lock_days > self.max_lock_days {
            return Err(EcoCredError::InvalidArgument(
                "lock bounds must satisfy 1 <= min <= max".into(),
            ));
        }
        if self.voting_period_secs <= 0 {
            return Err(EcoCredError::InvalidArgument("voting period must be positive".into()));
        }
        Ok(())
    }

    /// Return a copy with `update` applied and validated.
    pub fn with_update(&self, update: &ConfigUpdate) -> Result<Self, EcoCredError> {
        let mut next = self.clone();
        match update {
            ConfigUpdate::VerificationThreshold(v) => next.verification_threshold = *v,
            ConfigUpdate::BadgeThreshold(v) => next.badge_threshold = *v,
            ConfigUpdate::PlatformFeeBps(v) => next.platform_fee_bps = *v,
            ConfigUpdate::FeeRecipient(v) => next.fee_recipient = *v,
            ConfigUpdate::RewardRateBps(v) => next.reward_rate_bps = *v,
            ConfigUpdate::LockBounds { min_days, max_days } => {
                next.min_lock_days = *min_days;
                next.max_lock_days = *max_days;
            }
            ConfigUpdate::ProposalThreshold(v) => next.proposal_threshold = *v,
            ConfigUpdate::VotingPeriodSecs(v) => next.voting_period_secs = *v,
            ConfigUpdate::Quorum(v) => next.quorum = *v,
            ConfigUpdate::Reputation(v) => next.reputation = *v,
        }
        next.validate()?;
        Ok(next)
    }
}

/// A single parameter change, applied by `Action::UpdateConfig`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigUpdate {
    VerificationThreshold(u32),
    BadgeThreshold(Amount),
    PlatformFeeBps(u16),
    FeeRecipient(Option<Address>),
    RewardRateBps(u32),
    LockBounds { min_days: u32, max_days: u32 },
    ProposalThreshold(Amount),
    VotingPeriodSecs(i64),
    Quorum(Amount),
    Reputation(ReputationModel),
}

impl ConfigUpdate {
    /// Parameter name and rendered value, as carried by `Event::ConfigUpdated`.
    pub fn describe(&self) -> (&'static str, String) {
        match self {
            ConfigUpdate::VerificationThreshold(v) => ("verification_threshold", v.to_string()),
            ConfigUpdate::BadgeThreshold(v) => ("badge_threshold", v.to_string()),
            ConfigUpdate::PlatformFeeBps(v) => ("platform_fee_bps", v.to_string()),
            ConfigUpdate::FeeRecipient(v) => (
                "fee_recipient",
                v.map(|a| a.to_hex()).unwrap_or_else(|| "owner".into()),
            ),
            ConfigUpdate::RewardRateBps(v) => ("reward_rate_bps", v.to_string()),
            ConfigUpdate::LockBounds { min_days, max_days } => {
                ("lock_bounds", format!("{min_days}..={max_days}"))
            }
            ConfigUpdate::ProposalThreshold(v) => ("proposal_threshold", v.to_string()),
            ConfigUpdate::VotingPeriodSecs(v) => ("voting_period_secs", v.to_string()),
            ConfigUpdate::Quorum(v) => ("quorum", v.to_string()),
            ConfigUpdate::Reputation(v) => ("reputation", format!("{v:?}").to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        LedgerConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_threshold_rejected() {
        let err = LedgerConfig::default()
            .with_update(&ConfigUpdate::VerificationThreshold(0))
            .unwrap_err();
        assert!(matches!(err, EcoCredError::InvalidArgument(_)));
    }

    #[test]
    fn fee_above_ceiling_rejected() {
        let cfg = LedgerConfig::default();
        assert!(cfg.with_update(&ConfigUpdate::PlatformFeeBps(MAX_PLATFORM_FEE_BPS)).is_ok());
        assert!(cfg.with_update(&ConfigUpdate::PlatformFeeBps(MAX_PLATFORM_FEE_BPS + 1)).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: LedgerConfig =
            serde_json::from_str(r#"{"verification_threshold": 2, "reputation": "tiered"}"#).unwrap();
        assert_eq!(cfg.verification_threshold, 2);
        assert_eq!(cfg.reputation, ReputationModel::Tiered);
        assert_eq!(cfg.platform_fee_bps, DEFAULT_PLATFORM_FEE_BPS);
    }
}
