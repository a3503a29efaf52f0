use serde::{Deserialize, Serialize};

use crate::constants::EVENT_SCHEMA_VERSION;
use crate::types::{
    ActionId, Address, Amount, BadgeId, ListingId, ProposalId, RetirementId, Role, StakeId,
    Timestamp,
};
use crate::units::amount_string;

/// Ledger events consumed by off-chain indexers.
///
/// Serialized as an internally tagged JSON object (`{"type": "Transfer", ...}`);
/// amounts are base-unit decimal strings. Adding a variant or a field bumps
/// `EVENT_SCHEMA_VERSION`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Event {
    // ── Credit ledger ────────────────────────────────────────────────────────
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },
    MinterUpdated { minter: Address },
    MinterAdded { minter: Address },
    MinterRemoved { minter: Address },
    OwnershipTransferred { previous: Address, new_owner: Address },
    NativeTransfer {
        from: Address,
        to: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
    },

    // ── Access control ───────────────────────────────────────────────────────
    RoleGranted { account: Address, role: Role, granted_by: Address },
    RoleRevoked { account: Address, previous: Role, revoked_by: Address },

    // ── Badges ───────────────────────────────────────────────────────────────
    /// `from` is the null address on issuance.
    BadgeTransfer { from: Address, to: Address, badge_id: BadgeId },
    BadgeApproval { owner: Address, approved: Option<Address>, badge_id: BadgeId },
    BadgeBaseUriUpdated { base_uri: String },
    BadgeIssuerAdded { issuer: Address },
    BadgeIssuerRemoved { issuer: Address },

    // ── Verification ─────────────────────────────────────────────────────────
    EcoActionLogged { action_id: ActionId, company: Address, title: String, category: String },
    ActionVerified { action_id: ActionId, verifier: Address, approved: bool, actual_credits: u64 },
    /// Fires once per action; `actual_credits` is the awarded fixed-point
    /// amount, 0 when the action was rejected.
    ActionFullyVerified {
        action_id: ActionId,
        #[serde(with = "amount_string")]
        actual_credits: Amount,
    },

    // ── Marketplace ──────────────────────────────────────────────────────────
    ListingCreated {
        listing_id: ListingId,
        seller: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
        #[serde(with = "amount_string")]
        price_per_credit: Amount,
    },
    PurchaseExecuted {
        listing_id: ListingId,
        buyer: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
        #[serde(with = "amount_string")]
        total_price: Amount,
    },
    ListingCancelled { listing_id: ListingId },

    // ── Staking ──────────────────────────────────────────────────────────────
    Staked {
        user: Address,
        stake_id: StakeId,
        #[serde(with = "amount_string")]
        amount: Amount,
        lock_period_days: u32,
    },
    Unstaked {
        user: Address,
        stake_id: StakeId,
        #[serde(with = "amount_string")]
        amount: Amount,
        #[serde(with = "amount_string")]
        reward: Amount,
    },

    // ── Retirement ───────────────────────────────────────────────────────────
    CreditsRetired {
        retirement_id: RetirementId,
        retirer: Address,
        #[serde(with = "amount_string")]
        amount: Amount,
        reason: String,
        certificate_id: String,
    },

    // ── Governance ───────────────────────────────────────────────────────────
    ProposalCreated { proposal_id: ProposalId, proposer: Address, description: String, deadline: Timestamp },
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        support: bool,
        #[serde(with = "amount_string")]
        power: Amount,
    },
    ProposalExecuted { proposal_id: ProposalId },

    // ── Analytics / configuration ────────────────────────────────────────────
    LeaderboardUpdated {
        company: Address,
        rank: u32,
        #[serde(with = "amount_string")]
        credits: Amount,
    },
    /// `value` is rendered with `ConfigUpdate::describe`.
    ConfigUpdated { parameter: String, value: String },
}

impl Event {
    /// Variant name, as written in the `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::MinterUpdated { .. } => "MinterUpdated",
            Event::MinterAdded { .. } => "MinterAdded",
            Event::MinterRemoved { .. } => "MinterRemoved",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::NativeTransfer { .. } => "NativeTransfer",
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRevoked { .. } => "RoleRevoked",
            Event::BadgeTransfer { .. } => "BadgeTransfer",
            Event::BadgeApproval { .. } => "BadgeApproval",
            Event::BadgeBaseUriUpdated { .. } => "BadgeBaseUriUpdated",
            Event::BadgeIssuerAdded { .. } => "BadgeIssuerAdded",
            Event::BadgeIssuerRemoved { .. } => "BadgeIssuerRemoved",
            Event::EcoActionLogged { .. } => "EcoActionLogged",
            Event::ActionVerified { .. } => "ActionVerified",
            Event::ActionFullyVerified { .. } => "ActionFullyVerified",
            Event::ListingCreated { .. } => "ListingCreated",
            Event::PurchaseExecuted { .. } => "PurchaseExecuted",
            Event::ListingCancelled { .. } => "ListingCancelled",
            Event::Staked { .. } => "Staked",
            Event::Unstaked { .. } => "Unstaked",
            Event::CreditsRetired { .. } => "CreditsRetired",
            Event::ProposalCreated { .. } => "ProposalCreated",
            Event::VoteCast { .. } => "VoteCast",
            Event::ProposalExecuted { .. } => "ProposalExecuted",
            Event::LeaderboardUpdated { .. } => "LeaderboardUpdated",
            Event::ConfigUpdated { .. } => "ConfigUpdated",
        }
    }
}

/// An event as committed to the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub version: u16,
    /// Global, gap-free, 1-based event sequence.
    pub seq: u64,
    /// Sequence of the transaction that emitted the event.
    pub tx_seq: u64,
    pub timestamp: Timestamp,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(seq: u64, tx_seq: u64, timestamp: Timestamp, event: Event) -> Self {
        Self { version: EVENT_SCHEMA_VERSION, seq, tx_seq, timestamp, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CREDIT_UNIT;

    #[test]
    fn json_shape_is_tagged_with_string_amounts() {
        let env = EventEnvelope::new(
            3,
            2,
            1_700_000_000,
            Event::ActionFullyVerified { action_id: 1, actual_credits: 480 * CREDIT_UNIT },
        );
        let v: serde_json::Value = serde_json::to_value(&env).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["event"]["type"], "ActionFullyVerified");
        assert_eq!(v["event"]["actual_credits"], "480000000000000000000");
        let back: EventEnvelope = serde_json::from_value(v).unwrap();
        assert_eq!(back, env);
    }
}
