//! ecocred-genesis
//!
//! Builds the founding ledger state from `GenesisParams` and commits it as
//! ledger transaction #1. Genesis bypasses the transition engine: it is the
//! only place where roles, minters and balances are written without an
//! authorizing caller.
//!
//! Genesis writes:
//!
//! 1. Token owner, minter set, badge issuer set (the verification principal)
//! 2. Roles: admins, verifiers, moderators, and ADMIN for the governance
//!    principal unless disabled
//! 3. Ledger configuration
//! 4. Native and credit allocations

pub mod params;

pub use params::{Allocation, GenesisParams};

use std::collections::BTreeSet;

use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::TokenInfo;
use ecocred_core::transaction::{Output, Receipt};
use ecocred_core::types::{Address, Amount, Module, Role, Timestamp};
use ecocred_state::{LedgerView, StagedState, StateDb};
use tracing::info;

/// `meta` key holding the BLAKE3 hash of the applied genesis parameters.
pub const GENESIS_HASH_META: &str = "genesis_hash";

/// Apply genesis to an empty `StateDb`.
///
/// Fails if the ledger is already initialized or the parameters are invalid.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams, now: Timestamp) -> Result<Receipt, EcoCredError> {
    if db.is_initialized()? {
        return Err(EcoCredError::Other("ledger already has a genesis state".into()));
    }
    validate(params)?;
    info!(owner = %params.owner, "applying EcoCred genesis state");

    let mut st = StagedState::new(db, now);

    // ── 1. Token, minters, badge issuers ─────────────────────────────────────
    let minters: BTreeSet<Address> = params.minters.iter().copied().collect();
    st.put_minters(&minters)?;
    st.emit(Event::OwnershipTransferred { previous: Address::ZERO, new_owner: params.owner });
    for minter in &minters {
        st.emit(Event::MinterAdded { minter: *minter });
    }
    let issuers: BTreeSet<Address> = [Module::Verification.address()].into_iter().collect();
    st.put_badge_issuers(&issuers)?;
    st.emit(Event::BadgeIssuerAdded { issuer: Module::Verification.address() });
    if !params.badge_base_uri.is_empty() {
        st.put_badge_base_uri(&params.badge_base_uri)?;
        st.emit(Event::BadgeBaseUriUpdated { base_uri: params.badge_base_uri.clone() });
    }

    // ── 2. Roles ─────────────────────────────────────────────────────────────
    let mut grants: Vec<(Address, Role)> = Vec::new();
    grants.extend(params.admins.iter().map(|a| (*a, Role::Admin)));
    grants.extend(params.verifiers.iter().map(|a| (*a, Role::Verifier)));
    grants.extend(params.moderators.iter().map(|a| (*a, Role::Moderator)));
    if params.governance_admin {
        grants.push((Module::Governance.address(), Role::Admin));
    }
    for (account, role) in &grants {
        st.put_role(account, *role)?;
        st.emit(Event::RoleGranted { account: *account, role: *role, granted_by: Address::ZERO });
    }
    info!(grants = grants.len(), "genesis: roles assigned");

    // ── 3. Configuration ─────────────────────────────────────────────────────
    st.put_config(&params.config)?;

    // ── 4. Allocations ───────────────────────────────────────────────────────
    for alloc in &params.native_allocations {
        let next = st
            .native_balance_of(&alloc.address)?
            .checked_add(alloc.amount)
            .ok_or(EcoCredError::ArithmeticOverflow)?;
        st.put_native_balance(&alloc.address, next)?;
    }

    let mut supply: Amount = 0;
    for alloc in &params.credit_allocations {
        let next = st
            .balance_of(&alloc.address)?
            .checked_add(alloc.amount)
            .ok_or(EcoCredError::ArithmeticOverflow)?;
        st.put_balance(&alloc.address, next)?;
        supply = supply.checked_add(alloc.amount).ok_or(EcoCredError::ArithmeticOverflow)?;
        st.emit(Event::Transfer { from: Address::ZERO, to: alloc.address, amount: alloc.amount });
    }
    st.put_token_info(&TokenInfo { owner: params.owner, total_supply: supply, total_burned: 0 })?;
    info!(
        native = params.native_allocations.len(),
        credits = params.credit_allocations.len(),
        supply = %supply,
        "genesis: allocations written"
    );

    st.mark_initialized()?;
    let receipt = db.commit(st, None, Output::None)?;

    verify_genesis_supply(db)?;
    db.put_meta(GENESIS_HASH_META, genesis_hash(params)?.as_bytes())?;
    db.flush()?;
    info!(events = receipt.events.len(), "genesis state committed to disk");
    Ok(receipt)
}

fn validate(params: &GenesisParams) -> Result<(), EcoCredError> {
    if params.owner.is_zero() {
        return Err(EcoCredError::InvalidArgument("genesis owner must not be the null address".into()));
    }
    params.config.validate()?;
    let all = params
        .admins
        .iter()
        .chain(&params.verifiers)
        .chain(&params.moderators)
        .chain(&params.minters)
        .chain(params.native_allocations.iter().map(|a| &a.address))
        .chain(params.credit_allocations.iter().map(|a| &a.address));
    if all.into_iter().any(Address::is_zero) {
        return Err(EcoCredError::InvalidArgument("genesis may not reference the null address".into()));
    }
    let mut seen = BTreeSet::new();
    for a in params.admins.iter().chain(&params.verifiers).chain(&params.moderators) {
        if !seen.insert(*a) {
            return Err(EcoCredError::InvalidArgument(format!("{a} is assigned more than one role")));
        }
    }
    Ok(())
}

/// Sum of committed balances must equal the recorded supply.
fn verify_genesis_supply(db: &StateDb) -> Result<(), EcoCredError> {
    let recorded = db.token_info()?.total_supply;
    let balances: Vec<Amount> = db.load_all(ecocred_state::keys::BALANCE)?;
    let total = balances
        .iter()
        .try_fold(0u128, |acc, b| acc.checked_add(*b))
        .ok_or(EcoCredError::ArithmeticOverflow)?;
    if total != recorded {
        return Err(EcoCredError::Other(format!(
            "genesis supply mismatch: recorded {recorded}, balances sum to {total}"
        )));
    }
    info!(total = %total, "genesis supply verified");
    Ok(())
}

/// Hex BLAKE3 of the canonical JSON encoding of `params`.
pub fn genesis_hash(params: &GenesisParams) -> Result<String, EcoCredError> {
    let bytes = serde_json::to_vec(params).map_err(|e| EcoCredError::Serialization(e.to_string()))?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}
