use serde::{Deserialize, Serialize};

use ecocred_core::config::LedgerConfig;
use ecocred_core::event::EventEnvelope;
use ecocred_core::records::{
    ActionStatus, Badge, CompanyProfile, EcoAction, LeaderboardEntry, Listing, ListingStatus,
    PlatformStats, Proposal, Retirement, Stake,
};
use ecocred_core::transaction::{Output, Receipt};
use ecocred_core::types::{ActionId, Address, BadgeId, Module, Timestamp};

// All amounts below are base-unit decimal strings (u128 does not fit a JSON number).

/// Outcome of `ecocred_sendTransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReceipt {
    pub tx_id: String,
    pub seq: u64,
    pub caller: Address,
    /// Id of the entity created by the transaction, if any.
    pub created_id: Option<u64>,
    pub events: Vec<EventEnvelope>,
    pub applied_at: Timestamp,
}

impl From<Receipt> for RpcReceipt {
    fn from(r: Receipt) -> Self {
        Self {
            tx_id: r.tx_id.to_hex(),
            seq: r.seq,
            caller: r.caller,
            created_id: match r.output {
                Output::Id(id) => Some(id),
                Output::None => None,
            },
            events: r.events,
            applied_at: r.applied_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSupply {
    pub total_supply: String,
    pub total_burned: String,
    pub total_retired: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAction {
    pub id: ActionId,
    pub company: Address,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub estimated_credits: u64,
    pub status: ActionStatus,
    pub approval_count: u32,
    pub rejection_count: u32,
    pub awarded_credits: String,
    pub created_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
}

impl From<EcoAction> for RpcAction {
    fn from(a: EcoAction) -> Self {
        Self {
            id: a.id,
            company: a.company,
            title: a.title,
            description: a.description,
            category: a.category,
            location: a.location,
            estimated_credits: a.estimated_credits,
            status: a.status,
            approval_count: a.approval_count,
            rejection_count: a.rejection_count,
            awarded_credits: a.awarded_credits.to_string(),
            created_at: a.created_at,
            finalized_at: a.finalized_at,
        }
    }
}

/// Company profile joined with the live balance and leaderboard rank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCompany {
    pub company: Address,
    pub balance: String,
    pub total_credits_earned: String,
    pub actions_submitted: u64,
    pub actions_verified: u64,
    pub actions_rejected: u64,
    pub reputation_score: u32,
    pub badges: u64,
    pub rank: Option<u32>,
    pub first_seen: Timestamp,
}

impl RpcCompany {
    pub fn new(p: CompanyProfile, balance: u128, badges: u64, rank: Option<u32>) -> Self {
        Self {
            company: p.company,
            balance: balance.to_string(),
            total_credits_earned: p.total_credits_earned.to_string(),
            actions_submitted: p.actions_submitted,
            actions_verified: p.actions_verified,
            actions_rejected: p.actions_rejected,
            reputation_score: p.reputation_score,
            badges,
            rank,
            first_seen: p.first_seen,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcBadge {
    pub id: BadgeId,
    pub owner: Address,
    pub approved: Option<Address>,
    pub action_id: Option<ActionId>,
    pub minted_at: Timestamp,
    pub token_uri: String,
}

impl RpcBadge {
    pub fn new(b: Badge, token_uri: String) -> Self {
        Self {
            id: b.id,
            owner: b.owner,
            approved: b.approved,
            action_id: b.action_id,
            minted_at: b.minted_at,
            token_uri,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcListing {
    pub id: u64,
    pub seller: Address,
    pub amount: String,
    pub remaining: String,
    pub price_per_credit: String,
    pub status: ListingStatus,
    pub created_at: Timestamp,
}

impl From<Listing> for RpcListing {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            seller: l.seller,
            amount: l.amount.to_string(),
            remaining: l.remaining.to_string(),
            price_per_credit: l.price_per_credit.to_string(),
            status: l.status,
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcStake {
    /// Position in the staker's list; the argument `Unstake` expects.
    pub index: u32,
    pub id: u64,
    pub amount: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub lock_days: u32,
    pub reward_rate_bps: u32,
    pub claimed: bool,
    /// Reward paid if claimed, otherwise the reward accrued so far.
    pub reward: String,
}

impl RpcStake {
    pub fn new(index: u32, s: Stake, reward: u128) -> Self {
        Self {
            index,
            id: s.id,
            amount: s.amount.to_string(),
            start_time: s.start_time,
            end_time: s.end_time,
            lock_days: s.lock_days,
            reward_rate_bps: s.reward_rate_bps,
            claimed: s.claimed,
            reward: reward.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRetirement {
    pub id: u64,
    pub retirer: Address,
    pub amount: String,
    pub reason: String,
    pub certificate_id: String,
    pub retired_at: Timestamp,
}

impl From<Retirement> for RpcRetirement {
    fn from(r: Retirement) -> Self {
        Self {
            id: r.id,
            retirer: r.retirer,
            amount: r.amount.to_string(),
            reason: r.reason,
            certificate_id: r.certificate_id,
            retired_at: r.retired_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcProposal {
    pub id: u64,
    pub proposer: Address,
    pub description: String,
    pub target: Module,
    pub payload_hex: String,
    pub votes_for: String,
    pub votes_against: String,
    pub deadline: Timestamp,
    pub executed: bool,
    /// "Open", "Executed" or "Expired" at query time.
    pub state: String,
    pub created_at: Timestamp,
}

impl RpcProposal {
    pub fn new(p: Proposal, now: Timestamp) -> Self {
        let state = format!("{:?}", p.state(now));
        Self {
            id: p.id,
            proposer: p.proposer,
            description: p.description,
            target: p.target,
            payload_hex: hex::encode(&p.payload),
            votes_for: p.votes_for.to_string(),
            votes_against: p.votes_against.to_string(),
            deadline: p.deadline,
            executed: p.executed,
            state,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcLeaderboardEntry {
    pub rank: u32,
    pub company: Address,
    pub credits: String,
    pub reputation_score: u32,
    pub actions_verified: u64,
}

impl From<LeaderboardEntry> for RpcLeaderboardEntry {
    fn from(e: LeaderboardEntry) -> Self {
        Self {
            rank: e.rank,
            company: e.company,
            credits: e.credits.to_string(),
            reputation_score: e.reputation_score,
            actions_verified: e.actions_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPlatformStats {
    pub total_supply: String,
    pub total_burned: String,
    pub total_retired: String,
    pub retirements: u64,
    pub actions_submitted: u64,
    pub actions_verified: u64,
    pub actions_rejected: u64,
    pub companies: u64,
    pub active_listings: u64,
    pub credits_listed: String,
    pub total_staked: String,
    pub badges_issued: u64,
    pub proposals: u64,
}

impl From<PlatformStats> for RpcPlatformStats {
    fn from(s: PlatformStats) -> Self {
        Self {
            total_supply: s.total_supply.to_string(),
            total_burned: s.total_burned.to_string(),
            total_retired: s.total_retired.to_string(),
            retirements: s.retirements,
            actions_submitted: s.actions_submitted,
            actions_verified: s.actions_verified,
            actions_rejected: s.actions_rejected,
            companies: s.companies,
            active_listings: s.active_listings,
            credits_listed: s.credits_listed.to_string(),
            total_staked: s.total_staked.to_string(),
            badges_issued: s.badges_issued,
            proposals: s.proposals,
        }
    }
}

/// `LedgerConfig` with string amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub verification_threshold: u32,
    pub badge_threshold: String,
    pub platform_fee_bps: u16,
    pub fee_recipient: Option<Address>,
    pub reward_rate_bps: u32,
    pub min_lock_days: u32,
    pub max_lock_days: u32,
    pub proposal_threshold: String,
    pub voting_period_secs: i64,
    pub quorum: String,
    pub reputation: String,
}

impl From<LedgerConfig> for RpcConfig {
    fn from(c: LedgerConfig) -> Self {
        Self {
            verification_threshold: c.verification_threshold,
            badge_threshold: c.badge_threshold.to_string(),
            platform_fee_bps: c.platform_fee_bps,
            fee_recipient: c.fee_recipient,
            reward_rate_bps: c.reward_rate_bps,
            min_lock_days: c.min_lock_days,
            max_lock_days: c.max_lock_days,
            proposal_threshold: c.proposal_threshold.to_string(),
            voting_period_secs: c.voting_period_secs,
            quorum: c.quorum.to_string(),
            reputation: format!("{:?}", c.reputation).to_lowercase(),
        }
    }
}

/// Node and ledger summary returned by `ecocred_getInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcInfo {
    pub node_version: String,
    pub event_schema_version: u16,
    pub genesis_time: Option<Timestamp>,
    pub genesis_hash: Option<String>,
    pub tx_count: u64,
    pub event_count: u64,
    pub token_owner: Address,
    /// Principal address of every module.
    pub modules: Vec<(Module, Address)>,
    /// False when the node serves reads only.
    pub accepts_transactions: bool,
}
