//! Fungible credit ledger and native currency balances.

use ecocred_core::config::ConfigUpdate;
use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::types::{Address, Amount, Role};
use tracing::info;

use crate::staged::StagedState;
use crate::view::LedgerView;

// ── Balance primitives ────────────────────────────────────────────────────────

fn credit(st: &mut StagedState<'_>, to: &Address, amount: Amount) -> Result<(), EcoCredError> {
    let next = st.balance_of(to)?.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_balance(to, next)
}

fn debit(st: &mut StagedState<'_>, from: &Address, amount: Amount) -> Result<(), EcoCredError> {
    let have = st.balance_of(from)?;
    if have < amount {
        return Err(EcoCredError::InsufficientBalance { need: amount, have });
    }
    st.put_balance(from, have - amount)
}

fn spend_allowance(
    st: &mut StagedState<'_>,
    owner: &Address,
    spender: &Address,
    amount: Amount,
) -> Result<(), EcoCredError> {
    let have = st.allowance(owner, spender)?;
    if have < amount {
        return Err(EcoCredError::InsufficientAllowance { need: amount, have });
    }
    st.put_allowance(owner, spender, have - amount)
}

fn require_positive(amount: Amount) -> Result<(), EcoCredError> {
    if amount == 0 {
        return Err(EcoCredError::InvalidArgument("amount must be positive".into()));
    }
    Ok(())
}

fn require_owner(st: &StagedState<'_>, caller: &Address) -> Result<(), EcoCredError> {
    if st.token_info()?.owner != *caller {
        return Err(EcoCredError::Unauthorized(format!("{caller} is not the token owner")));
    }
    Ok(())
}

// ── Credit operations ─────────────────────────────────────────────────────────

pub fn mint(st: &mut StagedState<'_>, minter: &Address, to: &Address, amount: Amount) -> Result<(), EcoCredError> {
    if !st.is_minter(minter)? {
        return Err(EcoCredError::Unauthorized(format!("{minter} is not an authorized minter")));
    }
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    require_positive(amount)?;

    let mut info = st.token_info()?;
    info.total_supply = info.total_supply.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    credit(st, to, amount)?;
    st.put_token_info(&info)?;
    st.emit(Event::Transfer { from: Address::ZERO, to: *to, amount });
    Ok(())
}

pub fn transfer(st: &mut StagedState<'_>, from: &Address, to: &Address, amount: Amount) -> Result<(), EcoCredError> {
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    require_positive(amount)?;
    debit(st, from, amount)?;
    credit(st, to, amount)?;
    st.emit(Event::Transfer { from: *from, to: *to, amount });
    Ok(())
}

/// Move `owner`'s credits on behalf of `spender`, consuming exactly `amount`
/// of the allowance.
pub fn transfer_from(
    st: &mut StagedState<'_>,
    spender: &Address,
    owner: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), EcoCredError> {
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    require_positive(amount)?;
    spend_allowance(st, owner, spender, amount)?;
    debit(st, owner, amount)?;
    credit(st, to, amount)?;
    st.emit(Event::Transfer { from: *owner, to: *to, amount });
    Ok(())
}

pub fn approve(st: &mut StagedState<'_>, owner: &Address, spender: &Address, amount: Amount) -> Result<(), EcoCredError> {
    if spender.is_zero() {
        return Err(EcoCredError::InvalidArgument("spender must not be the null address".into()));
    }
    st.put_allowance(owner, spender, amount)?;
    st.emit(Event::Approval { owner: *owner, spender: *spender, amount });
    Ok(())
}

pub fn burn(st: &mut StagedState<'_>, from: &Address, amount: Amount) -> Result<(), EcoCredError> {
    require_positive(amount)?;
    debit(st, from, amount)?;
    let mut info = st.token_info()?;
    info.total_supply = info.total_supply.checked_sub(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    info.total_burned = info.total_burned.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_token_info(&info)?;
    st.emit(Event::Transfer { from: *from, to: Address::ZERO, amount });
    Ok(())
}

pub fn burn_from(st: &mut StagedState<'_>, spender: &Address, owner: &Address, amount: Amount) -> Result<(), EcoCredError> {
    require_positive(amount)?;
    spend_allowance(st, owner, spender, amount)?;
    burn(st, owner, amount)
}

// ── Minting authority / ownership ─────────────────────────────────────────────

/// Collapse the minter set to `{minter}`.
pub fn set_minter(st: &mut StagedState<'_>, caller: &Address, minter: &Address) -> Result<(), EcoCredError> {
    require_owner(st, caller)?;
    if minter.is_zero() {
        return Err(EcoCredError::InvalidArgument("minter must not be the null address".into()));
    }
    st.put_minters(&[*minter].into_iter().collect())?;
    info!(%minter, "minter set collapsed to a single minter");
    st.emit(Event::MinterUpdated { minter: *minter });
    Ok(())
}

pub fn add_minter(st: &mut StagedState<'_>, caller: &Address, minter: &Address) -> Result<(), EcoCredError> {
    require_owner(st, caller)?;
    if minter.is_zero() {
        return Err(EcoCredError::InvalidArgument("minter must not be the null address".into()));
    }
    let mut minters = st.minters()?;
    if !minters.insert(*minter) {
        return Err(EcoCredError::InvalidArgument(format!("{minter} is already a minter")));
    }
    st.put_minters(&minters)?;
    st.emit(Event::MinterAdded { minter: *minter });
    Ok(())
}

pub fn remove_minter(st: &mut StagedState<'_>, caller: &Address, minter: &Address) -> Result<(), EcoCredError> {
    require_owner(st, caller)?;
    let mut minters = st.minters()?;
    if !minters.remove(minter) {
        return Err(EcoCredError::not_found("minter", minter));
    }
    st.put_minters(&minters)?;
    st.emit(Event::MinterRemoved { minter: *minter });
    Ok(())
}

pub fn transfer_ownership(st: &mut StagedState<'_>, caller: &Address, new_owner: &Address) -> Result<(), EcoCredError> {
    require_owner(st, caller)?;
    if new_owner.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    let mut info = st.token_info()?;
    let previous = info.owner;
    info.owner = *new_owner;
    st.put_token_info(&info)?;
    st.emit(Event::OwnershipTransferred { previous, new_owner: *new_owner });
    Ok(())
}

/// Owner or ADMIN may change a ledger parameter.
pub fn update_config(st: &mut StagedState<'_>, caller: &Address, update: &ConfigUpdate) -> Result<(), EcoCredError> {
    if st.token_info()?.owner != *caller && !st.has_role(caller, Role::Admin)? {
        return Err(EcoCredError::Unauthorized(format!("{caller} may not change ledger configuration")));
    }
    let next = st.config()?.with_update(update)?;
    st.put_config(&next)?;
    let (parameter, value) = update.describe();
    info!(parameter, %value, "ledger configuration updated");
    st.emit(Event::ConfigUpdated { parameter: parameter.to_string(), value });
    Ok(())
}

// ── Native currency ───────────────────────────────────────────────────────────

pub(crate) fn debit_native(st: &mut StagedState<'_>, from: &Address, amount: Amount) -> Result<(), EcoCredError> {
    let have = st.native_balance_of(from)?;
    if have < amount {
        return Err(EcoCredError::InsufficientBalance { need: amount, have });
    }
    st.put_native_balance(from, have - amount)
}

pub(crate) fn credit_native(st: &mut StagedState<'_>, to: &Address, amount: Amount) -> Result<(), EcoCredError> {
    let next = st.native_balance_of(to)?.checked_add(amount).ok_or(EcoCredError::ArithmeticOverflow)?;
    st.put_native_balance(to, next)
}

pub fn transfer_native(st: &mut StagedState<'_>, from: &Address, to: &Address, amount: Amount) -> Result<(), EcoCredError> {
    if to.is_zero() {
        return Err(EcoCredError::InvalidRecipient);
    }
    require_positive(amount)?;
    debit_native(st, from, amount)?;
    credit_native(st, to, amount)?;
    st.emit(Event::NativeTransfer { from: *from, to: *to, amount });
    Ok(())
}

#[cfg(test)]
mod tests {
    use ecocred_core::event::Event;
    use ecocred_core::transaction::Action;
    use ecocred_core::types::Module;

    use super::*;
    use crate::testutil::{credits, Fixture};

    #[test]
    fn mint_requires_authorized_minter() {
        let f = Fixture::new("mint_auth");
        let err = f.apply(f.company, Action::Mint { to: f.company, amount: 1 }).unwrap_err();
        assert!(matches!(err, EcoCredError::Unauthorized(_)));

        let r = f.apply_as(Module::Staking, Action::Mint { to: f.company, amount: 7 }).unwrap();
        assert_eq!(r.events[0].event, Event::Transfer { from: Address::ZERO, to: f.company, amount: 7 });
        assert_eq!(f.engine.db.token_info().unwrap().total_supply, 7);
    }

    #[test]
    fn mint_to_null_rejected() {
        let f = Fixture::new("mint_null");
        let err = f.apply_as(Module::Verification, Action::Mint { to: Address::ZERO, amount: 1 }).unwrap_err();
        assert!(matches!(err, EcoCredError::InvalidRecipient));
    }

    #[test]
    fn transfer_moves_balance() {
        let f = Fixture::new("transfer");
        f.fund(f.company, credits(10));
        f.apply(f.company, Action::Transfer { to: f.buyer, amount: credits(4) }).unwrap();
        assert_eq!(f.engine.db.balance_of(&f.company).unwrap(), credits(6));
        assert_eq!(f.engine.db.balance_of(&f.buyer).unwrap(), credits(4));

        let err = f.apply(f.company, Action::Transfer { to: f.buyer, amount: credits(7) }).unwrap_err();
        assert!(matches!(err, EcoCredError::InsufficientBalance { .. }));
        let err = f.apply(f.company, Action::Transfer { to: Address::ZERO, amount: 1 }).unwrap_err();
        assert!(matches!(err, EcoCredError::InvalidRecipient));
    }

    #[test]
    fn transfer_from_consumes_exact_allowance() {
        let f = Fixture::new("transfer_from");
        f.fund(f.company, credits(10));
        f.apply(f.company, Action::Approve { spender: f.buyer, amount: credits(5) }).unwrap();
        f.apply(f.buyer, Action::TransferFrom { owner: f.company, to: f.buyer, amount: credits(3) }).unwrap();
        assert_eq!(f.engine.db.allowance(&f.company, &f.buyer).unwrap(), credits(2));

        let err = f
            .apply(f.buyer, Action::TransferFrom { owner: f.company, to: f.buyer, amount: credits(3) })
            .unwrap_err();
        assert!(matches!(err, EcoCredError::InsufficientAllowance { .. }));
    }

    #[test]
    fn approve_with_max_is_not_infinite() {
        let f = Fixture::new("approve_max");
        f.fund(f.company, credits(10));
        f.apply(f.company, Action::Approve { spender: f.buyer, amount: Amount::MAX }).unwrap();
        f.apply(f.buyer, Action::TransferFrom { owner: f.company, to: f.buyer, amount: credits(1) }).unwrap();
        assert_eq!(f.engine.db.allowance(&f.company, &f.buyer).unwrap(), Amount::MAX - credits(1));
    }

    #[test]
    fn burn_and_burn_from_reduce_supply() {
        let f = Fixture::new("burn");
        f.fund(f.company, credits(10));
        f.apply(f.company, Action::Burn { amount: credits(2) }).unwrap();
        f.apply(f.company, Action::Approve { spender: f.buyer, amount: credits(3) }).unwrap();
        f.apply(f.buyer, Action::BurnFrom { owner: f.company, amount: credits(3) }).unwrap();

        let info = f.engine.db.token_info().unwrap();
        assert_eq!(info.total_supply, credits(5));
        assert_eq!(info.total_burned, credits(5));
        assert_eq!(f.engine.db.balance_of(&f.company).unwrap(), credits(5));
    }

    #[test]
    fn minter_set_management_is_owner_only() {
        let f = Fixture::new("minters");
        let extra = Address::derive(b"bridge");
        let err = f.apply(f.admin, Action::AddMinter { minter: extra }).unwrap_err();
        assert!(matches!(err, EcoCredError::Unauthorized(_)));

        f.apply(f.owner, Action::AddMinter { minter: extra }).unwrap();
        assert!(f.engine.db.is_minter(&extra).unwrap());
        f.apply(f.owner, Action::RemoveMinter { minter: extra }).unwrap();
        assert!(!f.engine.db.is_minter(&extra).unwrap());
        let err = f.apply(f.owner, Action::RemoveMinter { minter: extra }).unwrap_err();
        assert!(matches!(err, EcoCredError::NotFound { .. }));
    }

    #[test]
    fn set_minter_collapses_set() {
        let f = Fixture::new("set_minter");
        f.apply(f.owner, Action::SetMinter { minter: Module::Staking.address() }).unwrap();
        let minters = f.engine.db.minters().unwrap();
        assert_eq!(minters.len(), 1);
        assert!(!minters.contains(&Module::Verification.address()));
    }

    #[test]
    fn ownership_transfer_moves_owner_rights() {
        let f = Fixture::new("ownership");
        let next = Address::derive(b"next-owner");
        f.apply(f.owner, Action::TransferOwnership { new_owner: next }).unwrap();
        let err = f.apply(f.owner, Action::AddMinter { minter: next }).unwrap_err();
        assert!(matches!(err, EcoCredError::Unauthorized(_)));
        f.apply(next, Action::AddMinter { minter: next }).unwrap();
    }

    #[test]
    fn native_transfer() {
        let f = Fixture::new("native");
        f.apply(f.buyer, Action::TransferNative { to: f.company, amount: credits(10) }).unwrap();
        assert_eq!(f.engine.db.native_balance_of(&f.company).unwrap(), credits(10));
        let err = f.apply(f.company, Action::TransferNative { to: f.buyer, amount: credits(11) }).unwrap_err();
        assert!(matches!(err, EcoCredError::InsufficientBalance { .. }));
    }

    #[test]
    fn config_update_by_admin_only() {
        let f = Fixture::new("config");
        let update = ConfigUpdate::VerificationThreshold(2);
        let err = f.apply(f.company, Action::UpdateConfig { update: update.clone() }).unwrap_err();
        assert!(matches!(err, EcoCredError::Unauthorized(_)));
        let r = f.apply(f.admin, Action::UpdateConfig { update }).unwrap();
        assert_eq!(f.engine.db.config().unwrap().verification_threshold, 2);
        assert!(matches!(&r.events[0].event, Event::ConfigUpdated { parameter, .. } if parameter == "verification_threshold"));
    }
}
