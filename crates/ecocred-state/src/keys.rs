//! Key layout of the `ledger` tree.
//!
//! Every entity lives under a short ASCII prefix followed by fixed-width
//! binary components. Integer ids are big-endian so that prefix scans return
//! entities in id order.

use ecocred_core::types::{ActionId, Address, BadgeId, ListingId, ProposalId, RetirementId, StakeId, TxId};

pub const BALANCE: &[u8] = b"bal/";
pub const ALLOWANCE: &[u8] = b"alw/";
pub const NATIVE: &[u8] = b"nat/";
pub const ROLE: &[u8] = b"role/";
pub const ACTION: &[u8] = b"act/";
pub const VERIFICATION: &[u8] = b"ver/";
pub const PROFILE: &[u8] = b"prof/";
pub const BADGE: &[u8] = b"bdg/";
pub const BADGE_COUNT: &[u8] = b"bdgc/";
pub const LISTING: &[u8] = b"lst/";
pub const STAKE: &[u8] = b"stk/";
pub const USER_STAKES: &[u8] = b"ustk/";
pub const RETIREMENT: &[u8] = b"ret/";
pub const USER_RETIRED: &[u8] = b"uret/";
pub const PROPOSAL: &[u8] = b"prop/";
pub const VOTE: &[u8] = b"vote/";
pub const EVENT: &[u8] = b"evt/";
pub const RECEIPT: &[u8] = b"rcpt/";
pub const TX_INDEX: &[u8] = b"txi/";
pub const META: &[u8] = b"meta/";

fn join(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let len = prefix.len() + parts.iter().map(|p| p.len()).sum::<usize>();
    let mut key = Vec::with_capacity(len);
    key.extend_from_slice(prefix);
    for p in parts {
        key.extend_from_slice(p);
    }
    key
}

pub fn balance(account: &Address) -> Vec<u8> {
    join(BALANCE, &[account.as_bytes()])
}

pub fn allowance(owner: &Address, spender: &Address) -> Vec<u8> {
    join(ALLOWANCE, &[owner.as_bytes(), spender.as_bytes()])
}

pub fn native(account: &Address) -> Vec<u8> {
    join(NATIVE, &[account.as_bytes()])
}

pub fn role(account: &Address) -> Vec<u8> {
    join(ROLE, &[account.as_bytes()])
}

pub fn action(id: ActionId) -> Vec<u8> {
    join(ACTION, &[&id.to_be_bytes()])
}

pub fn verification(action_id: ActionId, verifier: &Address) -> Vec<u8> {
    join(VERIFICATION, &[&action_id.to_be_bytes(), verifier.as_bytes()])
}

/// All verification records of one action.
pub fn verifications_of(action_id: ActionId) -> Vec<u8> {
    join(VERIFICATION, &[&action_id.to_be_bytes()])
}

pub fn profile(company: &Address) -> Vec<u8> {
    join(PROFILE, &[company.as_bytes()])
}

pub fn badge(id: BadgeId) -> Vec<u8> {
    join(BADGE, &[&id.to_be_bytes()])
}

pub fn badge_count(owner: &Address) -> Vec<u8> {
    join(BADGE_COUNT, &[owner.as_bytes()])
}

pub fn listing(id: ListingId) -> Vec<u8> {
    join(LISTING, &[&id.to_be_bytes()])
}

pub fn stake(id: StakeId) -> Vec<u8> {
    join(STAKE, &[&id.to_be_bytes()])
}

pub fn user_stakes(user: &Address) -> Vec<u8> {
    join(USER_STAKES, &[user.as_bytes()])
}

pub fn retirement(id: RetirementId) -> Vec<u8> {
    join(RETIREMENT, &[&id.to_be_bytes()])
}

pub fn user_retired(user: &Address) -> Vec<u8> {
    join(USER_RETIRED, &[user.as_bytes()])
}

pub fn proposal(id: ProposalId) -> Vec<u8> {
    join(PROPOSAL, &[&id.to_be_bytes()])
}

pub fn vote(proposal_id: ProposalId, voter: &Address) -> Vec<u8> {
    join(VOTE, &[&proposal_id.to_be_bytes(), voter.as_bytes()])
}

pub fn event(seq: u64) -> Vec<u8> {
    join(EVENT, &[&seq.to_be_bytes()])
}

pub fn receipt(seq: u64) -> Vec<u8> {
    join(RECEIPT, &[&seq.to_be_bytes()])
}

pub fn tx_index(tx_id: &TxId) -> Vec<u8> {
    join(TX_INDEX, &[tx_id.as_bytes()])
}

pub fn meta(name: &str) -> Vec<u8> {
    join(META, &[name.as_bytes()])
}

/// Well-known singleton names under `META`.
pub mod meta_names {
    pub const GENESIS: &str = "genesis";
    pub const TOKEN: &str = "token";
    pub const MINTERS: &str = "minters";
    pub const CONFIG: &str = "config";
    pub const BADGE_ISSUERS: &str = "badge_issuers";
    pub const BADGE_BASE_URI: &str = "badge_base_uri";
    pub const RETIRED_TOTAL: &str = "retired_total";
    pub const TX_SEQ: &str = "seq/tx";
    pub const EVENT_SEQ: &str = "seq/event";
}
