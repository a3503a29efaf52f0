use std::collections::BTreeSet;

use ecocred_core::config::LedgerConfig;
use ecocred_core::error::EcoCredError;
use ecocred_core::records::{
    Badge, CompanyProfile, EcoAction, Listing, Proposal, Retirement, Stake, TokenInfo,
    VerificationRecord, VoteRecord,
};
use ecocred_core::types::{
    ActionId, Address, Amount, BadgeId, ListingId, ProposalId, RetirementId, Role, StakeId,
};
use serde::de::DeserializeOwned;

use crate::keys::{self, meta_names};
use crate::staged::Counter;

/// Raw key/value access to the ledger keyspace.
pub trait StateRead {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EcoCredError>;

    /// Every entry under `prefix`, in key order.
    fn scan_raw(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EcoCredError>;
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EcoCredError> {
    bincode::deserialize(bytes).map_err(|e| EcoCredError::Serialization(e.to_string()))
}

/// Typed lookups over any `StateRead`: the committed database and the staged
/// overlay of an in-flight transaction read state the same way.
pub trait LedgerView: StateRead {
    fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, EcoCredError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_all<T: DeserializeOwned>(&self, prefix: &[u8]) -> Result<Vec<T>, EcoCredError> {
        self.scan_raw(prefix)?.iter().map(|(_, v)| decode(v)).collect()
    }

    // ── Credit ledger ────────────────────────────────────────────────────────

    fn balance_of(&self, account: &Address) -> Result<Amount, EcoCredError> {
        Ok(self.load(&keys::balance(account))?.unwrap_or(0))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Result<Amount, EcoCredError> {
        Ok(self.load(&keys::allowance(owner, spender))?.unwrap_or(0))
    }

    fn native_balance_of(&self, account: &Address) -> Result<Amount, EcoCredError> {
        Ok(self.load(&keys::native(account))?.unwrap_or(0))
    }

    fn token_info(&self) -> Result<TokenInfo, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::TOKEN))?.unwrap_or_default())
    }

    fn minters(&self) -> Result<BTreeSet<Address>, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::MINTERS))?.unwrap_or_default())
    }

    fn is_minter(&self, account: &Address) -> Result<bool, EcoCredError> {
        Ok(self.minters()?.contains(account))
    }

    fn config(&self) -> Result<LedgerConfig, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::CONFIG))?.unwrap_or_default())
    }

    // ── Access control ───────────────────────────────────────────────────────

    fn role_of(&self, account: &Address) -> Result<Role, EcoCredError> {
        Ok(self.load(&keys::role(account))?.unwrap_or_default())
    }

    fn has_role(&self, account: &Address, role: Role) -> Result<bool, EcoCredError> {
        Ok(self.role_of(account)? == role)
    }

    // ── Verification ─────────────────────────────────────────────────────────

    fn action(&self, id: ActionId) -> Result<Option<EcoAction>, EcoCredError> {
        self.load(&keys::action(id))
    }

    fn verification(
        &self,
        action_id: ActionId,
        verifier: &Address,
    ) -> Result<Option<VerificationRecord>, EcoCredError> {
        self.load(&keys::verification(action_id, verifier))
    }

    fn verifications(&self, action_id: ActionId) -> Result<Vec<VerificationRecord>, EcoCredError> {
        self.load_all(&keys::verifications_of(action_id))
    }

    fn profile(&self, company: &Address) -> Result<Option<CompanyProfile>, EcoCredError> {
        self.load(&keys::profile(company))
    }

    fn profiles(&self) -> Result<Vec<CompanyProfile>, EcoCredError> {
        self.load_all(keys::PROFILE)
    }

    // ── Badges ───────────────────────────────────────────────────────────────

    fn badge(&self, id: BadgeId) -> Result<Option<Badge>, EcoCredError> {
        self.load(&keys::badge(id))
    }

    fn badge_count(&self, owner: &Address) -> Result<u64, EcoCredError> {
        Ok(self.load(&keys::badge_count(owner))?.unwrap_or(0))
    }

    fn badge_issuers(&self) -> Result<BTreeSet<Address>, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::BADGE_ISSUERS))?.unwrap_or_default())
    }

    fn badge_base_uri(&self) -> Result<String, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::BADGE_BASE_URI))?.unwrap_or_default())
    }

    // ── Marketplace ──────────────────────────────────────────────────────────

    fn listing(&self, id: ListingId) -> Result<Option<Listing>, EcoCredError> {
        self.load(&keys::listing(id))
    }

    fn listings(&self) -> Result<Vec<Listing>, EcoCredError> {
        self.load_all(keys::LISTING)
    }

    // ── Staking ──────────────────────────────────────────────────────────────

    fn stake(&self, id: StakeId) -> Result<Option<Stake>, EcoCredError> {
        self.load(&keys::stake(id))
    }

    /// Stake ids of `user` in creation order; `Unstake` indexes this list.
    fn stake_ids_of(&self, user: &Address) -> Result<Vec<StakeId>, EcoCredError> {
        Ok(self.load(&keys::user_stakes(user))?.unwrap_or_default())
    }

    fn stakes_of(&self, user: &Address) -> Result<Vec<Stake>, EcoCredError> {
        let mut out = Vec::new();
        for id in self.stake_ids_of(user)? {
            let stake = self.stake(id)?.ok_or_else(|| EcoCredError::not_found("stake", id))?;
            out.push(stake);
        }
        Ok(out)
    }

    fn stakes(&self) -> Result<Vec<Stake>, EcoCredError> {
        self.load_all(keys::STAKE)
    }

    // ── Retirement ───────────────────────────────────────────────────────────

    fn retirement(&self, id: RetirementId) -> Result<Option<Retirement>, EcoCredError> {
        self.load(&keys::retirement(id))
    }

    fn retired_by(&self, user: &Address) -> Result<Amount, EcoCredError> {
        Ok(self.load(&keys::user_retired(user))?.unwrap_or(0))
    }

    fn retired_total(&self) -> Result<Amount, EcoCredError> {
        Ok(self.load(&keys::meta(meta_names::RETIRED_TOTAL))?.unwrap_or(0))
    }

    // ── Governance ───────────────────────────────────────────────────────────

    fn proposal(&self, id: ProposalId) -> Result<Option<Proposal>, EcoCredError> {
        self.load(&keys::proposal(id))
    }

    fn vote_of(&self, proposal_id: ProposalId, voter: &Address) -> Result<Option<VoteRecord>, EcoCredError> {
        self.load(&keys::vote(proposal_id, voter))
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    /// Last id issued for `counter` (0 = none yet).
    fn counter(&self, counter: Counter) -> Result<u64, EcoCredError> {
        Ok(self.load(&counter.key())?.unwrap_or(0))
    }

    fn is_initialized(&self) -> Result<bool, EcoCredError> {
        Ok(self.get_raw(&keys::meta(meta_names::GENESIS))?.is_some())
    }
}

impl<T: StateRead + ?Sized> LedgerView for T {}
