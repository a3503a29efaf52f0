//! Reputation scoring and the credit multiplier derived from it.

use std::sync::Arc;

use ecocred_core::config::ReputationModel;
use ecocred_core::constants::{
    CREDITS_PER_REPUTATION_POINT, CREDIT_UNIT, MAX_REPUTATION_SCORE, NEUTRAL_MULTIPLIER_BPS,
};
use ecocred_core::records::CompanyProfile;
use ecocred_core::types::Amount;

/// Reputation score for a company that has earned `total_credits`
/// (fixed-point): one point per ten whole credits, capped.
pub fn score_for(total_credits: Amount) -> u32 {
    let points = total_credits / CREDIT_UNIT / CREDITS_PER_REPUTATION_POINT;
    points.min(MAX_REPUTATION_SCORE as u128) as u32
}

/// Turns a company profile into a credit multiplier in basis points
/// (10 000 = 1.0×). Applied to the verified credits before minting.
pub trait ReputationStrategy: Send + Sync {
    fn score(&self, profile: &CompanyProfile) -> u32;
}

/// Every company receives exactly the verified amount.
pub struct FlatMultiplier;

impl ReputationStrategy for FlatMultiplier {
    fn score(&self, _profile: &CompanyProfile) -> u32 {
        NEUTRAL_MULTIPLIER_BPS
    }
}

/// Bonus by reputation tier: +5% from 250, +10% from 500, +20% from 750.
pub struct TieredMultiplier;

impl ReputationStrategy for TieredMultiplier {
    fn score(&self, profile: &CompanyProfile) -> u32 {
        match profile.reputation_score {
            s if s >= 750 => 12_000,
            s if s >= 500 => 11_000,
            s if s >= 250 => 10_500,
            _ => NEUTRAL_MULTIPLIER_BPS,
        }
    }
}

pub fn strategy_for(model: ReputationModel) -> Arc<dyn ReputationStrategy> {
    match model {
        ReputationModel::Flat => Arc::new(FlatMultiplier),
        ReputationModel::Tiered => Arc::new(TieredMultiplier),
    }
}
