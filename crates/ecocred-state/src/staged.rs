use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use ecocred_core::config::LedgerConfig;
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::{
    Badge, CompanyProfile, EcoAction, Listing, Proposal, Retirement, Stake, TokenInfo,
    VerificationRecord, VoteRecord,
};
use ecocred_core::types::{Address, Amount, Role, StakeId, Timestamp};
use serde::Serialize;

use crate::db::StateDb;
use crate::keys::{self, meta_names};
use crate::view::{LedgerView, StateRead};

/// Monotonic id sequences. Each starts at 1 and is never reused, even when
/// the entity is later cancelled or claimed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    Action,
    Badge,
    Listing,
    Stake,
    Retirement,
    Proposal,
}

impl Counter {
    fn name(&self) -> &'static str {
        match self {
            Counter::Action => "counter/action",
            Counter::Badge => "counter/badge",
            Counter::Listing => "counter/listing",
            Counter::Stake => "counter/stake",
            Counter::Retirement => "counter/retirement",
            Counter::Proposal => "counter/proposal",
        }
    }

    pub(crate) fn key(&self) -> Vec<u8> {
        keys::meta(self.name())
    }
}

/// Pending writes of one transaction layered over the committed database.
///
/// Reads see staged writes first. Nothing reaches sled until the engine hands
/// the finished overlay to `StateDb::commit`; dropping it discards the
/// transaction, including consumed ids and emitted events.
pub struct StagedState<'a> {
    db: &'a StateDb,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    events: Vec<Event>,
    now: Timestamp,
}

/// The finished contents of a `StagedState`.
pub struct StagedChanges {
    pub writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    pub events: Vec<Event>,
}

impl StateRead for StagedState<'_> {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EcoCredError> {
        match self.writes.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.db.get_raw(key),
        }
    }

    fn scan_raw(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EcoCredError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.db.scan_raw(prefix)?.into_iter().collect();
        let range = self.writes.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
        for (key, value) in range {
            if !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl<'a> StagedState<'a> {
    pub fn new(db: &'a StateDb, now: Timestamp) -> Self {
        Self { db, writes: BTreeMap::new(), events: Vec::new(), now }
    }

    /// Block time of the transaction being applied.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn store<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), EcoCredError> {
        let bytes = bincode::serialize(value).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
        self.writes.insert(key, Some(bytes));
        Ok(())
    }

    pub fn remove(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    /// Reserve the next id of `counter`.
    pub fn next_id(&mut self, counter: Counter) -> Result<u64, EcoCredError> {
        let next = self.counter(counter)?.checked_add(1).ok_or(EcoCredError::ArithmeticOverflow)?;
        self.store(counter.key(), &next)?;
        Ok(next)
    }

    pub(crate) fn into_changes(self) -> StagedChanges {
        StagedChanges { writes: self.writes, events: self.events }
    }

    // ── Typed writers ────────────────────────────────────────────────────────

    pub fn put_balance(&mut self, account: &Address, amount: Amount) -> Result<(), EcoCredError> {
        if amount == 0 {
            self.remove(keys::balance(account));
            Ok(())
        } else {
            self.store(keys::balance(account), &amount)
        }
    }

    pub fn put_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), EcoCredError> {
        if amount == 0 {
            self.remove(keys::allowance(owner, spender));
            Ok(())
        } else {
            self.store(keys::allowance(owner, spender), &amount)
        }
    }

    pub fn put_native_balance(&mut self, account: &Address, amount: Amount) -> Result<(), EcoCredError> {
        if amount == 0 {
            self.remove(keys::native(account));
            Ok(())
        } else {
            self.store(keys::native(account), &amount)
        }
    }

    pub fn put_token_info(&mut self, info: &TokenInfo) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::TOKEN), info)
    }

    pub fn put_minters(&mut self, minters: &BTreeSet<Address>) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::MINTERS), minters)
    }

    pub fn put_config(&mut self, config: &LedgerConfig) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::CONFIG), config)
    }

    pub fn put_role(&mut self, account: &Address, role: Role) -> Result<(), EcoCredError> {
        if role == Role::None {
            self.remove(keys::role(account));
            Ok(())
        } else {
            self.store(keys::role(account), &role)
        }
    }

    pub fn put_action(&mut self, action: &EcoAction) -> Result<(), EcoCredError> {
        self.store(keys::action(action.id), action)
    }

    pub fn put_verification(&mut self, record: &VerificationRecord) -> Result<(), EcoCredError> {
        self.store(keys::verification(record.action_id, &record.verifier), record)
    }

    pub fn put_profile(&mut self, profile: &CompanyProfile) -> Result<(), EcoCredError> {
        self.store(keys::profile(&profile.company), profile)
    }

    pub fn put_badge(&mut self, badge: &Badge) -> Result<(), EcoCredError> {
        self.store(keys::badge(badge.id), badge)
    }

    pub fn put_badge_count(&mut self, owner: &Address, count: u64) -> Result<(), EcoCredError> {
        self.store(keys::badge_count(owner), &count)
    }

    pub fn put_badge_issuers(&mut self, issuers: &BTreeSet<Address>) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::BADGE_ISSUERS), issuers)
    }

    pub fn put_badge_base_uri(&mut self, uri: &str) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::BADGE_BASE_URI), &uri)
    }

    pub fn put_listing(&mut self, listing: &Listing) -> Result<(), EcoCredError> {
        self.store(keys::listing(listing.id), listing)
    }

    pub fn put_stake(&mut self, stake: &Stake) -> Result<(), EcoCredError> {
        self.store(keys::stake(stake.id), stake)
    }

    pub fn put_stake_ids(&mut self, user: &Address, ids: &[StakeId]) -> Result<(), EcoCredError> {
        self.store(keys::user_stakes(user), &ids)
    }

    pub fn put_retirement(&mut self, retirement: &Retirement) -> Result<(), EcoCredError> {
        self.store(keys::retirement(retirement.id), retirement)
    }

    pub fn put_retired_by(&mut self, user: &Address, amount: Amount) -> Result<(), EcoCredError> {
        self.store(keys::user_retired(user), &amount)
    }

    pub fn put_retired_total(&mut self, amount: Amount) -> Result<(), EcoCredError> {
        self.store(keys::meta(meta_names::RETIRED_TOTAL), &amount)
    }

    pub fn put_proposal(&mut self, proposal: &Proposal) -> Result<(), EcoCredError> {
        self.store(keys::proposal(proposal.id), proposal)
    }

    pub fn put_vote(&mut self, vote: &VoteRecord) -> Result<(), EcoCredError> {
        self.store(keys::vote(vote.proposal_id, &vote.voter), vote)
    }

    /// Record that genesis ran. `apply` refuses to run on an unmarked ledger.
    pub fn mark_initialized(&mut self) -> Result<(), EcoCredError> {
        let now = self.now;
        self.store(keys::meta(meta_names::GENESIS), &now)
    }
}
