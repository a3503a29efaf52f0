//! Achievement badges: non-fungible, sequential ids, never reused.

use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::records::Badge;
use ecocred_core::types::{ActionId, Address, BadgeId};

use crate::staged::{Counter, StagedState};
use crate::view::LedgerView;

fn require_token_owner(st: &StagedState<'_>, caller: &Address) -> Result<(), EcoCredError> {
    if st.token_info()?.owner != *caller {
        return Err(EcoCredError::Unauthorized(format!("{caller} may not configure badges")));
    }
    Ok(())
}

fn load_badge(st: &StagedState<'_>, id: BadgeId) -> Result<Badge, EcoCredError> {
    st.badge(id)?.ok_or_else(|| EcoCredError::not_found("badge", id))
}

fn adjust_count(st: &mut StagedState<'_>, owner: &Address, up: bool) -> Result<(), EcoCredError> {
    let count = st.badge_count(owner)?;
    let next = if up {
        count.checked_add(1).ok_or(EcoCredError::ArithmeticOverflow)?
    } else {
        count.checked_sub(1).ok_or(EcoCredError::ArithmeticOverflow)?
    };
    st.put_badge_count(owner, next)
}

/// Mint the next badge to `to`. `issuer` must be in the issuer set.
pub fn issue(
    st: &mut StagedState<'_>,
    issuer: &Address,
    to: &Address,
    action_id: Option<ActionId>,
) -> Result<BadgeId, EcoCredError> {
    if !st.badge_issuers()?.contains(issuer) {
        return Err(EcoCredError::Unauthorized(format!("{issuer} is not a badge issuer")));
    }
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    let id = st.next_id(Counter::Badge)?;
    let badge = Badge { id, owner: *to, approved: None, action_id, minted_at: st.now() };
    st.put_badge(&badge)?;
    adjust_count(st, to, true)?;
    st.emit(Event::BadgeTransfer { from: Address::ZERO, to: *to, badge_id: id });
    Ok(id)
}

/// Move a badge. The caller must own it or be its approved address; the
/// approval is cleared on transfer.
pub fn transfer(
    st: &mut StagedState<'_>,
    caller: &Address,
    from: &Address,
    to: &Address,
    id: BadgeId,
) -> Result<(), EcoCredError> {
    let mut badge = load_badge(st, id)?;
    if badge.owner != *from {
        return Err(EcoCredError::InvalidArgument(format!("badge {id} is not owned by {from}")));
    }
    if *caller != badge.owner && badge.approved != Some(*caller) {
        return Err(EcoCredError::Unauthorized(format!("{caller} may not transfer badge {id}")));
    }
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    badge.owner = *to;
    badge.approved = None;
    st.put_badge(&badge)?;
    adjust_count(st, from, false)?;
    adjust_count(st, to, true)?;
    st.emit(Event::BadgeTransfer { from: *from, to: *to, badge_id: id });
    Ok(())
}

pub fn approve(
    st: &mut StagedState<'_>,
    caller: &Address,
    approved: Option<Address>,
    id: BadgeId,
) -> Result<(), EcoCredError> {
    let mut badge = load_badge(st, id)?;
    if badge.owner != *caller {
        return Err(EcoCredError::Unauthorized(format!("{caller} does not own badge {id}")));
    }
    badge.approved = approved.filter(|a| !a.is_zero());
    st.put_badge(&badge)?;
    st.emit(Event::BadgeApproval { owner: *caller, approved: badge.approved, badge_id: id });
    Ok(())
}

pub fn set_base_uri(st: &mut StagedState<'_>, caller: &Address, base_uri: &str) -> Result<(), EcoCredError> {
    require_token_owner(st, caller)?;
    st.put_badge_base_uri(base_uri)?;
    st.emit(Event::BadgeBaseUriUpdated { base_uri: base_uri.to_string() });
    Ok(())
}

pub fn add_issuer(st: &mut StagedState<'_>, caller: &Address, issuer: &Address) -> Result<(), EcoCredError> {
    require_token_owner(st, caller)?;
    let mut issuers = st.badge_issuers()?;
    if !issuers.insert(*issuer) {
        return Err(EcoCredError::InvalidArgument(format!("{issuer} is already a badge issuer")));
    }
    st.put_badge_issuers(&issuers)?;
    st.emit(Event::BadgeIssuerAdded { issuer: *issuer });
    Ok(())
}

pub fn remove_issuer(st: &mut StagedState<'_>, caller: &Address, issuer: &Address) -> Result<(), EcoCredError> {
    require_token_owner(st, caller)?;
    let mut issuers = st.badge_issuers()?;
    if !issuers.remove(issuer) {
        return Err(EcoCredError::not_found("badge issuer", issuer));
    }
    st.put_badge_issuers(&issuers)?;
    st.emit(Event::BadgeIssuerRemoved { issuer: *issuer });
    Ok(())
}

/// Base URI followed by the decimal badge id.
pub fn token_uri<V: LedgerView + ?Sized>(view: &V, id: BadgeId) -> Result<String, EcoCredError> {
    if view.badge(id)?.is_none() {
        return Err(EcoCredError::not_found("badge", id));
    }
    Ok(format!("{}{id}", view.badge_base_uri()?))
}
