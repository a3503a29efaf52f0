use serde::{Deserialize, Serialize};

use crate::types::{
    ActionId, Address, Amount, BadgeId, ListingId, Module, ProposalId, RetirementId, StakeId,
    Timestamp,
};

// ── Ledger ────────────────────────────────────────────────────────────────────

/// Singleton token metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenInfo {
    /// Account allowed to manage minters and registry settings.
    pub owner: Address,
    pub total_supply: Amount,
    /// Cumulative amount destroyed through burns and retirements.
    pub total_burned: Amount,
}

// ── Eco actions ───────────────────────────────────────────────────────────────

/// Lifecycle of a submitted action.
///
///   Submitted → Verified   (threshold reached, every contributing verdict approved)
///   Submitted → Rejected   (threshold reached, at least one rejection)
///
/// Both terminal states are immutable.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionStatus {
    Submitted,
    Verified,
    Rejected,
}

impl ActionStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ActionStatus::Submitted)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EcoAction {
    pub id: ActionId,
    pub company: Address,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Whole credits claimed by the company.
    pub estimated_credits: u64,
    pub location: String,
    pub status: ActionStatus,
    pub approval_count: u32,
    pub rejection_count: u32,
    /// Fixed-point credits minted to the company; 0 unless verified.
    pub awarded_credits: Amount,
    pub created_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
}

impl EcoAction {
    pub fn verdict_count(&self) -> u32 {
        self.approval_count + self.rejection_count
    }
}

/// One verifier's verdict on one action. Its existence is the at-most-once guarantee.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationRecord {
    pub action_id: ActionId,
    pub verifier: Address,
    pub approved: bool,
    /// Whole credits the verifier agreed to award.
    pub actual_credits: u64,
    pub comments: Option<String>,
    pub recorded_at: Timestamp,
}

/// Derived per-company aggregate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanyProfile {
    pub company: Address,
    pub total_credits_earned: Amount,
    pub actions_submitted: u64,
    pub actions_verified: u64,
    pub actions_rejected: u64,
    pub reputation_score: u32,
    pub first_seen: Timestamp,
}

impl CompanyProfile {
    pub fn new(company: Address, now: Timestamp) -> Self {
        Self {
            company,
            total_credits_earned: 0,
            actions_submitted: 0,
            actions_verified: 0,
            actions_rejected: 0,
            reputation_score: 0,
            first_seen: now,
        }
    }
}

// ── Badges ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub id: BadgeId,
    pub owner: Address,
    /// Address allowed to transfer this badge on the owner's behalf.
    pub approved: Option<Address>,
    /// Action whose verification earned the badge, if any.
    pub action_id: Option<ActionId>,
    pub minted_at: Timestamp,
}

// ── Marketplace ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    Active,
    Sold,
    Cancelled,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub id: ListingId,
    pub seller: Address,
    /// Credits originally offered.
    pub amount: Amount,
    /// Credits still for sale.
    pub remaining: Amount,
    /// Native base units per whole credit.
    pub price_per_credit: Amount,
    pub status: ListingStatus,
    pub created_at: Timestamp,
}

// ── Staking ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stake {
    pub id: StakeId,
    pub staker: Address,
    pub amount: Amount,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub lock_days: u32,
    /// Annual reward rate in force when the stake was opened.
    pub reward_rate_bps: u32,
    pub claimed: bool,
    /// Reward paid at unstake; 0 until claimed.
    pub reward_paid: Amount,
}

// ── Retirement ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retirement {
    pub id: RetirementId,
    pub retirer: Address,
    pub amount: Amount,
    pub reason: String,
    pub certificate_id: String,
    pub retired_at: Timestamp,
}

// ── Governance ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalState {
    Open,
    Executed,
    /// Deadline passed without execution.
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub description: String,
    pub target: Module,
    /// bincode-encoded `Action` dispatched on execution.
    pub payload: Vec<u8>,
    pub votes_for: Amount,
    pub votes_against: Amount,
    pub deadline: Timestamp,
    pub executed: bool,
    pub created_at: Timestamp,
}

impl Proposal {
    pub fn state(&self, now: Timestamp) -> ProposalState {
        if self.executed {
            ProposalState::Executed
        } else if now < self.deadline {
            ProposalState::Open
        } else {
            ProposalState::Expired
        }
    }
}

/// A voter's ballot; power is fixed at first vote.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub support: bool,
    pub power: Amount,
    pub cast_at: Timestamp,
}

// ── Analytics ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub company: Address,
    pub credits: Amount,
    pub reputation_score: u32,
    pub actions_verified: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PlatformStats {
    pub total_supply: Amount,
    pub total_burned: Amount,
    pub total_retired: Amount,
    pub retirements: u64,
    pub actions_submitted: u64,
    pub actions_verified: u64,
    pub actions_rejected: u64,
    pub companies: u64,
    pub active_listings: u64,
    pub credits_listed: Amount,
    pub total_staked: Amount,
    pub badges_issued: u64,
    pub proposals: u64,
}
