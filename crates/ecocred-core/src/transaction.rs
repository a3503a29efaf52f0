use serde::{Deserialize, Serialize};

use crate::config::ConfigUpdate;
use crate::error::EcoCredError;
use crate::event::EventEnvelope;
use crate::types::{
    ActionId, Address, Amount, BadgeId, ListingId, Module, ProposalId, Role, Timestamp, TxId,
};

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing ledger operation is one of these variants.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    // ── Credit ledger ────────────────────────────────────────────────────────

    /// Create credits. Caller must be an authorized minter.
    Mint { to: Address, amount: Amount },

    Transfer { to: Address, amount: Amount },

    /// Move `owner`'s credits using the caller's allowance.
    TransferFrom { owner: Address, to: Address, amount: Amount },

    /// Overwrite the caller's allowance for `spender`.
    Approve { spender: Address, amount: Amount },

    Burn { amount: Amount },

    BurnFrom { owner: Address, amount: Amount },

    /// Owner-only. Collapse the minter set to exactly `minter`.
    SetMinter { minter: Address },

    /// Owner-only. Authorize an additional minter.
    AddMinter { minter: Address },

    /// Owner-only. Revoke a minter.
    RemoveMinter { minter: Address },

    /// Owner-only. Hand token ownership to `new_owner`.
    TransferOwnership { new_owner: Address },

    /// Move native currency.
    TransferNative { to: Address, amount: Amount },

    // ── Access control ───────────────────────────────────────────────────────

    /// Admin-only. Replaces `account`'s previous role.
    GrantRole { account: Address, role: Role },

    /// Admin-only. Resets `account` to `Role::None`.
    RevokeRole { account: Address },

    // ── Achievement badges ───────────────────────────────────────────────────

    /// Issuer-only. Mint the next badge to `to`.
    IssueBadge { to: Address },

    /// Transfer a badge the caller owns or is approved for.
    TransferBadge { from: Address, to: Address, badge_id: BadgeId },

    /// Owner of `badge_id` sets (or clears) its approved address.
    ApproveBadge { approved: Option<Address>, badge_id: BadgeId },

    /// Token-owner-only.
    SetBadgeBaseUri { base_uri: String },

    /// Token-owner-only.
    AddBadgeIssuer { issuer: Address },

    /// Token-owner-only.
    RemoveBadgeIssuer { issuer: Address },

    // ── Verification ─────────────────────────────────────────────────────────

    /// Submit an environmental action for verification.
    LogEcoAction {
        title: String,
        description: String,
        /// Whole credits claimed.
        estimated_credits: u64,
        location: String,
        category: String,
    },

    /// Record the caller's verdict on an action. Caller must be a verifier or admin.
    VerifyAction {
        action_id: ActionId,
        approved: bool,
        /// Whole credits to award if approved.
        actual_credits: u64,
        comments: Option<String>,
    },

    // ── Marketplace ──────────────────────────────────────────────────────────

    /// Offer `amount` credits at `price_per_credit` native units per whole credit.
    /// Requires a standing allowance to the marketplace principal.
    CreateListing { amount: Amount, price_per_credit: Amount },

    /// Buy `amount` credits, offering `payment` native units.
    Purchase { listing_id: ListingId, amount: Amount, payment: Amount },

    CancelListing { listing_id: ListingId },

    // ── Staking ──────────────────────────────────────────────────────────────

    /// Lock credits. Requires an allowance to the staking principal.
    Stake { amount: Amount, lock_days: u32 },

    /// Claim principal and reward of the caller's `stake_index`-th stake.
    Unstake { stake_index: u32 },

    // ── Retirement ───────────────────────────────────────────────────────────

    RetireCredits { amount: Amount, reason: String, certificate_id: String },

    // ── Governance ───────────────────────────────────────────────────────────

    /// `payload` is an `Action` encoded with `Action::encode`.
    CreateProposal { description: String, target: Module, payload: Vec<u8> },

    Vote { proposal_id: ProposalId, support: bool },

    ExecuteProposal { proposal_id: ProposalId },

    // ── Configuration ────────────────────────────────────────────────────────

    /// Owner or admin only.
    UpdateConfig { update: ConfigUpdate },
}

impl Action {
    /// The module that owns this operation.
    pub fn module(&self) -> Module {
        match self {
            Action::Mint { .. }
            | Action::Transfer { .. }
            | Action::TransferFrom { .. }
            | Action::Approve { .. }
            | Action::Burn { .. }
            | Action::BurnFrom { .. }
            | Action::SetMinter { .. }
            | Action::AddMinter { .. }
            | Action::RemoveMinter { .. }
            | Action::TransferOwnership { .. }
            | Action::TransferNative { .. }
            | Action::UpdateConfig { .. } => Module::Ledger,
            Action::GrantRole { .. } | Action::RevokeRole { .. } => Module::AccessControl,
            Action::IssueBadge { .. }
            | Action::TransferBadge { .. }
            | Action::ApproveBadge { .. }
            | Action::SetBadgeBaseUri { .. }
            | Action::AddBadgeIssuer { .. }
            | Action::RemoveBadgeIssuer { .. } => Module::Badges,
            Action::LogEcoAction { .. } | Action::VerifyAction { .. } => Module::Verification,
            Action::CreateListing { .. } | Action::Purchase { .. } | Action::CancelListing { .. } => {
                Module::Marketplace
            }
            Action::Stake { .. } | Action::Unstake { .. } => Module::Staking,
            Action::RetireCredits { .. } => Module::Retirement,
            Action::CreateProposal { .. } | Action::Vote { .. } | Action::ExecuteProposal { .. } => {
                Module::Governance
            }
        }
    }

    /// Encode as a governance proposal payload.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(self).expect("action serialization is infallible")
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EcoCredError> {
        bincode::deserialize(bytes).map_err(|e| EcoCredError::Serialization(e.to_string()))
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A ledger call: one action on behalf of `caller`.
///
/// The ledger does not authenticate `caller`; the submitting service is
/// responsible for having verified the caller's wallet signature.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub caller: Address,
    pub action: Action,
    /// Opaque correlation id chosen by the submitter.
    #[serde(default)]
    pub client_ref: Option<u64>,
}

impl Transaction {
    pub fn new(caller: Address, action: Action) -> Self {
        Self { caller, action, client_ref: None }
    }

    /// Derive the id of this transaction when applied at ledger position `seq`.
    pub fn id_at(&self, seq: u64) -> TxId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seq.to_be_bytes());
        hasher.update(&bincode::serialize(self).expect("transaction serialization is infallible"));
        TxId::from_bytes(*hasher.finalize().as_bytes())
    }
}

// ── Receipt ───────────────────────────────────────────────────────────────────

/// Return value of an applied action.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Output {
    None,
    /// Id of the entity the action created (action, listing, stake, …).
    Id(u64),
}

impl Output {
    pub fn id(&self) -> Option<u64> {
        match self {
            Output::Id(id) => Some(*id),
            Output::None => None,
        }
    }
}

/// Outcome of a committed transaction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub tx_id: TxId,
    /// 1-based position of the transaction in the ledger.
    pub seq: u64,
    pub caller: Address,
    pub output: Output,
    pub events: Vec<EventEnvelope>,
    pub applied_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_bincode() {
        let action = Action::GrantRole { account: Address::derive(b"v"), role: Role::Verifier };
        assert_eq!(Action::decode(&action.encode()).unwrap(), action);
        assert!(Action::decode(&[0xff, 0xff]).is_err());
    }

    #[test]
    fn tx_id_depends_on_position() {
        let tx = Transaction::new(Address::derive(b"c"), Action::Burn { amount: 1 });
        assert_ne!(tx.id_at(1), tx.id_at(2));
        assert_eq!(tx.id_at(7), tx.id_at(7));
    }
}
